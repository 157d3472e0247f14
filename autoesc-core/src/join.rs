//! Joining forked branches.
//!
//! When several branches of a parse reach the same point they are merged
//! back into one. Inputs must agree exactly. Outputs are first compacted
//! so that only what can still influence the rest of the parse is
//! compared, then merged head to tail:
//!
//! 1. string chunks: any branch's chunk stands for all of them;
//! 2. multi-variable values: the sets are intersected, and a branch that
//!    lacks the value contributes the empty set;
//! 3. anything else must be equal on every branch.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

use crate::error::{JoinError, Result};
use crate::log::OutputLog;
use crate::output::Output;
use crate::tree::{Node, OutputTree, PartialOutput};
use crate::viz::{DetailLevel, Render};

const UNRECONCILABLE: &str = "Outputs cannot be reconciled";

/// Appends `output`, merging it into the head when the two coalesce.
pub fn cons(log: &OutputLog, output: Output) -> OutputLog {
    match log.head().and_then(|head| head.coalesce_with_follower(&output)) {
        Some(merged) => log.tail().append(merged),
        None => log.append(output),
    }
}

/// Reduces `log` to the events that still matter to the rest of a parse.
///
/// Dead values are dropped, closed regions are flattened into their
/// bodies, reorderable events move to the front of their region in a
/// stable order, and adjacent events are coalesced.
pub fn compact(log: &OutputLog) -> Result<OutputLog> {
    let tree = OutputTree::build(log)?;
    Ok(rebuild_relevant(tree.root(), OutputLog::new()))
}

fn rebuild_relevant(node: Node<'_>, mut out: OutputLog) -> OutputLog {
    match node.kind() {
        PartialOutput::Root => {}
        PartialOutput::Standalone(output) => {
            if output.is_parse_relevant(node) {
                out = cons(&out, output.clone());
            }
        }
        PartialOutput::BoundedRegion { left, right } => {
            if right.is_none() {
                out = cons(&out, Output::Binary(left.clone()));
            }
        }
    }
    for part in reordered_body(node) {
        out = rebuild_relevant(part, out);
    }
    out
}

/// The body with its reorderable events moved to the front, stably sorted.
fn reordered_body<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let (mut reorderable, rest): (Vec<Node<'t>>, Vec<Node<'t>>) = node
        .body()
        .partition(|part| part.standalone().is_some_and(Output::can_reorder));
    if reorderable.is_empty() {
        return rest;
    }
    reorderable.sort_by(|a, b| match (a.standalone(), b.standalone()) {
        (Some(a), Some(b)) => a.cmp_unary(b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    });
    reorderable.extend(rest);
    reorderable
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Strings,
    MultiValues,
    Equality,
}

impl Strategy {
    const IN_ORDER: [Strategy; 3] = [Strategy::Strings, Strategy::MultiValues, Strategy::Equality];

    /// The merged event for this step, if the strategy applies.
    fn reconcile(self, heads: &[Option<&Output>]) -> Result<Option<Output>, JoinError> {
        match self {
            Strategy::Strings => Ok(heads
                .iter()
                .flatten()
                .find(|head| head.as_string().is_some())
                .map(|head| (*head).clone())),
            Strategy::MultiValues => {
                let first = heads
                    .iter()
                    .flatten()
                    .find_map(|head| head.as_value().filter(|v| v.var().is_multi()));
                let Some(first) = first else {
                    return Ok(None);
                };
                let mut merged = first.clone();
                for head in heads.iter().copied() {
                    merged = match head.and_then(Output::as_value) {
                        Some(v) if v.var() == merged.var() => merged.intersection(v)?,
                        // This branch never bound the variable here.
                        _ => merged.var().empty_value().unwrap_or(merged),
                    };
                }
                Ok(Some(Output::Value(merged)))
            }
            Strategy::Equality => {
                let first = heads.first().copied().flatten();
                for head in heads {
                    if *head != first {
                        return Err(JoinError::Unjoinable {
                            reason: UNRECONCILABLE,
                            a: describe(first),
                            b: describe(*head),
                        });
                    }
                }
                Ok(first.cloned())
            }
        }
    }

    /// Whether a branch whose head is `current` is accounted for by `prior`.
    fn reconciles_with(self, prior: &Output, current: &Output) -> bool {
        match self {
            Strategy::Strings => current.as_string().is_some(),
            Strategy::MultiValues => match (prior, current) {
                (Output::Value(p), Output::Value(c)) => p.var() == c.var(),
                _ => false,
            },
            Strategy::Equality => prior == current,
        }
    }
}

fn describe(output: Option<&Output>) -> String {
    match output {
        Some(o) => o.render_to_string(DetailLevel::Long),
        None => "<end of output>".to_owned(),
    }
}

/// Merges the compacted outputs of several branches into one log.
pub fn reconcile_outputs(logs: &[OutputLog]) -> Result<OutputLog, JoinError> {
    if logs.is_empty() {
        return Err(JoinError::NoBranches);
    }
    let mut pending: Vec<VecDeque<Output>> = Vec::with_capacity(logs.len());
    for log in logs {
        let compacted = compact(log)?;
        pending.push(compacted.chronological().into_iter().cloned().collect());
    }
    debug!(
        branches = logs.len(),
        compacted = ?pending.iter().map(VecDeque::len).collect::<Vec<_>>(),
        "reconciling outputs"
    );

    let mut reconciled = OutputLog::new();
    while pending.iter().any(|q| !q.is_empty()) {
        let heads: Vec<Option<&Output>> = pending.iter().map(VecDeque::front).collect();
        let mut step = None;
        for strategy in Strategy::IN_ORDER {
            if let Some(merged) = strategy.reconcile(&heads)? {
                step = Some((strategy, merged));
                break;
            }
        }
        // Equality either yields the shared head or fails, so some
        // strategy always applies while output remains.
        let Some((strategy, merged)) = step else {
            break;
        };
        for q in pending.iter_mut() {
            if q.front().is_some_and(|head| strategy.reconciles_with(&merged, head)) {
                q.pop_front();
            }
        }
        reconciled = cons(&reconciled, merged);
    }
    debug!(events = reconciled.len(), "reconciled outputs");
    Ok(reconciled)
}

/// The common input of all branches.
pub fn reconcile_inputs<C: PartialEq + fmt::Display>(inputs: &[C]) -> Result<&C, JoinError> {
    let (first, rest) = inputs.split_first().ok_or(JoinError::NoBranches)?;
    match rest.iter().find(|input| *input != first) {
        Some(other) => Err(JoinError::InputsDiffer {
            a: first.to_string(),
            b: other.to_string(),
        }),
        None => Ok(first),
    }
}

/// Joins branches, each an output log and the input it stopped at.
pub fn join<C>(branches: &[(OutputLog, C)]) -> Result<(OutputLog, C), JoinError>
where
    C: Clone + PartialEq + fmt::Display,
{
    let inputs: Vec<&C> = branches.iter().map(|(_, input)| input).collect();
    let input = reconcile_inputs(&inputs)?;
    let logs: Vec<OutputLog> = branches.iter().map(|(log, _)| log.clone()).collect();
    let output = reconcile_outputs(&logs)?;
    debug!(branches = branches.len(), events = output.len(), "joined branches");
    Ok((output, C::clone(input)))
}
