//! The output log.
//!
//! A persistent singly-linked list of [`Output`] events, most recent first.
//! Appending allocates one cell pointing at the previous head, so a saved
//! position never changes when a sibling branch keeps appending. Forking is
//! `clone()`.
//!
//! ```text
//!   branch A ──▶ "x" ──┐
//!                      ├──▶ {/} ──▶ <Tag> ──▶ (empty)
//!   branch B ──▶ "y" ──┘
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::output::{BinaryOutput, Output, Side};
use crate::var::{Value, VarKey, VarType, Variable};

struct Cell {
    output: Output,
    /// Length of the log starting at this cell.
    len: usize,
    next: Option<Arc<Cell>>,
}

/// An immutable, structurally shared sequence of outputs.
#[derive(Clone, Default)]
pub struct OutputLog {
    head: Option<Arc<Cell>>,
}

impl OutputLog {
    pub fn new() -> Self {
        OutputLog { head: None }
    }

    /// Builds a log by appending `outputs` in order, so the last one ends up
    /// at the head.
    pub fn from_chronological(outputs: impl IntoIterator<Item = Output>) -> Self {
        outputs.into_iter().fold(OutputLog::new(), |log, o| log.append(o))
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of events; O(1).
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |cell| cell.len)
    }

    /// The most recent event.
    pub fn head(&self) -> Option<&Output> {
        self.head.as_ref().map(|cell| &cell.output)
    }

    /// Everything but the most recent event.
    pub fn tail(&self) -> OutputLog {
        OutputLog {
            head: self.head.as_ref().and_then(|cell| cell.next.clone()),
        }
    }

    /// The log as it was before its `n` most recent events were appended.
    pub fn drop_recent(&self, n: usize) -> OutputLog {
        let mut cell = self.head.as_ref();
        for _ in 0..n {
            match cell {
                Some(c) => cell = c.next.as_ref(),
                None => break,
            }
        }
        OutputLog { head: cell.cloned() }
    }

    pub fn split_first(&self) -> Option<(&Output, OutputLog)> {
        let cell = self.head.as_ref()?;
        Some((&cell.output, OutputLog { head: cell.next.clone() }))
    }

    /// A new log with `output` at the head; `self` is unchanged.
    pub fn append(&self, output: impl Into<Output>) -> OutputLog {
        let next = self.head.clone();
        let len = self.len() + 1;
        OutputLog {
            head: Some(Arc::new(Cell {
                output: output.into(),
                len,
                next,
            })),
        }
    }

    /// Events most recent first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// Events in the order they were appended.
    pub fn chronological(&self) -> Vec<&Output> {
        let mut events: Vec<&Output> = self.iter().collect();
        events.reverse();
        events
    }

    /// True if both logs are the same position, not merely equal.
    pub fn ptr_eq(&self, other: &OutputLog) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Searches backward for the most recent event satisfying `matches`
    /// that is in the current scope.
    ///
    /// `is_scope` picks out the region markers delimiting the scope. Closed
    /// nested scopes are skipped over entirely, and the search stops at the
    /// left side of the innermost open one. Events the scope predicate
    /// matches are never themselves returned.
    pub fn last_in_scope(
        &self,
        is_scope: impl Fn(&BinaryOutput) -> bool,
        matches: impl Fn(&Output) -> bool,
    ) -> Option<&Output> {
        let mut depth = 0usize;
        for output in self.iter() {
            if let Some(b) = output.as_binary() {
                if is_scope(b) {
                    match b.side() {
                        Side::Right => depth += 1,
                        Side::Left if depth == 0 => return None,
                        Side::Left => depth -= 1,
                    }
                    continue;
                }
            }
            if depth == 0 && matches(output) {
                return Some(output);
            }
        }
        None
    }

    /// The value event that currently binds `var`, with its type
    /// re-checked.
    pub fn current_value(&self, var: &VarKey) -> Result<Option<&Value>> {
        let found = self.last_in_scope(|b| b.is_scope_of(var), |o| o.is_set_of(var));
        match found.and_then(Output::as_value) {
            Some(value) => {
                value.checked_datum()?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// The current value of `var` at this position.
    pub fn value_of<T: VarType>(&self, var: &Variable<T>) -> Result<Option<T>> {
        match self.current_value(var.key())? {
            Some(value) => var.read(value).map(Some),
            None => Ok(None),
        }
    }
}

impl Drop for OutputLog {
    // Unlinks uniquely owned cells one at a time so a long log does not
    // recurse once per cell.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(cell) = next {
            match Arc::try_unwrap(cell) {
                Ok(mut cell) => next = cell.next.take(),
                Err(_) => break,
            }
        }
    }
}

/// Head-first iterator over an [`OutputLog`].
pub struct Iter<'a> {
    next: Option<&'a Cell>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Output;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next?;
        self.next = cell.next.as_deref();
        Some(&cell.output)
    }
}

impl<'a> IntoIterator for &'a OutputLog {
    type Item = &'a Output;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Collects in append order; see [`OutputLog::from_chronological`].
impl FromIterator<Output> for OutputLog {
    fn from_iter<I: IntoIterator<Item = Output>>(iter: I) -> Self {
        OutputLog::from_chronological(iter)
    }
}

impl PartialEq for OutputLog {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.iter().eq(other.iter()))
    }
}

impl Eq for OutputLog {}

impl fmt::Debug for OutputLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.chronological()).finish()
    }
}

/// Chronological, comma separated.
impl fmt::Display for OutputLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, output) in self.chronological().into_iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", output)?;
        }
        f.write_str("]")
    }
}
