//! Error types.
//!
//! Two classes of failure exist. A malformed log (a marker that is not on
//! the log, an orphaned right side, a value of the wrong type) is a bug in
//! whatever produced the log and is reported as an [`InvariantViolation`].
//! A speculative branch failing to match is not an error at all: the caller
//! rolls back instead of committing.

use thiserror::Error;

use crate::output::{BinaryOutput, Marker};
use crate::tree::NodeId;

/// Result alias for operations that can only fail on a malformed log.
pub type Result<T, E = InvariantViolation> = std::result::Result<T, E>;

/// A log producer broke one of the log's structural invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    /// Rollback or commit was requested for a marker that is not on the log.
    #[error("internal error: {marker} not on output")]
    MarkerNotFound { marker: Marker },

    /// Lookaheads leave no residue, so they are always rolled back.
    #[error("internal error: lookahead marker committed instead of rolled back")]
    LookaheadCommitted,

    /// A right side with no open left side expecting it.
    #[error("internal error: orphaned right side {output}")]
    OrphanedRightSide { output: BinaryOutput },

    /// A tree node was adopted twice.
    #[error("internal error: node {node} already has a parent")]
    ParentAlreadySet { node: NodeId },

    /// The root of a tree was given a parent.
    #[error("internal error: root cannot have a parent")]
    RootReparented,

    /// A value does not satisfy its variable's declared type.
    #[error("internal error: {variable} holds {found}, not a {expected}")]
    TypeMismatch {
        variable: String,
        expected: String,
        found: String,
    },
}

/// Invalid names handed to constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Not a dotted identifier.
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),

    /// No transform is registered under that name.
    #[error("unknown transform {0:?}")]
    UnknownTransform(String),
}

/// Two or more branches could not be reconciled into one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JoinError {
    /// There was nothing to join.
    #[error("no branches to join")]
    NoBranches,

    /// The branches stopped at different input positions.
    #[error("inputs cannot be reconciled : {a} != {b}")]
    InputsDiffer { a: String, b: String },

    /// The branches' outputs disagree.
    #[error("{reason} : {a} != {b}")]
    Unjoinable {
        reason: &'static str,
        a: String,
        b: String,
    },

    /// A branch's log was malformed.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}
