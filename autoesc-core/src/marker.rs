//! Speculation over the log.
//!
//! Every speculative construct pushes a [`Marker`] before trying its body
//! and resolves it exactly once:
//!
//! - [`OutputLog::rollback`] discards everything since the marker and hands
//!   the consumed text back to the input, so a sibling alternative can
//!   match it again;
//! - [`OutputLog::commit`] keeps everything and removes only the marker,
//!   coalescing the events that end up adjacent.
//!
//! Lookaheads are zero-width and are always rolled back.

use tracing::trace;

use crate::cursor::InputCursor;
use crate::error::{InvariantViolation, Result};
use crate::log::OutputLog;
use crate::output::{Marker, Output};

impl OutputLog {
    /// Opens a speculative region.
    pub fn push_marker(&self, marker: Marker) -> OutputLog {
        self.append(Output::Marker(marker))
    }

    /// Undoes everything appended since the most recent `marker`.
    ///
    /// Returns the log as it was before the marker was pushed, and `input`
    /// with the raw text of every discarded chunk put back in front of it.
    pub fn rollback<C: InputCursor>(&self, marker: Marker, input: &C) -> Result<(OutputLog, C)> {
        let mut chunks: Vec<&str> = Vec::new();
        let mut discarded = 0;
        let mut found = false;
        for output in self.iter() {
            if output.is_marker(marker) {
                found = true;
                break;
            }
            if let Some(s) = output.as_string() {
                chunks.push(s.raw());
            }
            discarded += 1;
        }
        if !found {
            return Err(InvariantViolation::MarkerNotFound { marker });
        }

        chunks.reverse();
        let restored = chunks.concat();
        trace!(%marker, discarded, restored_bytes = restored.len(), "rollback");

        Ok((self.drop_recent(discarded + 1), input.insert_before(&restored)))
    }

    /// Accepts everything appended since the most recent `marker`.
    pub fn commit(&self, marker: Marker) -> Result<OutputLog> {
        self.commit_with(marker, |_| {})
    }

    /// Like [`commit`](Self::commit), showing `observe` each kept event
    /// between the head and the marker, most recent first.
    pub fn commit_with(&self, marker: Marker, mut observe: impl FnMut(&Output)) -> Result<OutputLog> {
        if marker == Marker::Lookahead {
            return Err(InvariantViolation::LookaheadCommitted);
        }

        // Most recent first, so the last entry is the one right after the
        // marker.
        let mut kept: Vec<&Output> = Vec::new();
        let mut found = false;
        for output in self.iter() {
            if output.is_marker(marker) {
                found = true;
                break;
            }
            observe(output);
            kept.push(output);
        }
        if !found {
            return Err(InvariantViolation::MarkerNotFound { marker });
        }

        let mut rest = self.drop_recent(kept.len() + 1);
        let merged = match (rest.head(), kept.last()) {
            (Some(before), Some(after)) => before.coalesce_with_follower(after),
            _ => None,
        };
        let coalesced = merged.is_some();
        if let Some(merged) = merged {
            rest = rest.tail().append(merged);
            kept.pop();
        }
        trace!(%marker, kept = kept.len(), coalesced, "commit");

        if kept.is_empty() && !coalesced {
            return Ok(rest);
        }
        Ok(kept
            .into_iter()
            .rev()
            .fold(rest, |log, output| log.append(output.clone())))
    }

    /// Commits a [`Marker::Loop`] and reports whether the iteration
    /// consumed any input.
    ///
    /// A loop must stop after an iteration that consumed nothing, or a
    /// zero-width body would repeat forever.
    pub fn commit_iteration(&self) -> Result<(OutputLog, bool)> {
        let mut consumed = false;
        let log = self.commit_with(Marker::Loop, |output| {
            if output.as_string().is_some_and(|s| !s.raw().is_empty()) {
                consumed = true;
            }
        })?;
        Ok((log, consumed))
    }
}
