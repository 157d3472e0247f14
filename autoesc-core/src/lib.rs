//! Autoescaping output log core
//!
//! The immutable, append-only record of parse progress used by a
//! backtracking, context-sensitive autoescaping parser. Abandoning a branch
//! never requires undoing state: a branch is just a position in a shared
//! log.
//!
//! # Architecture
//!
//! - **output.rs** - Closed set of output events (regions, chunks, values, markers)
//! - **log.rs** - Persistent shared-tail log, scope-aware backward search
//! - **marker.rs** - Ephemeral marker protocol: push, rollback, commit
//! - **tree.rs** - Arena tree rebuilt from a flat log
//! - **relevance.rs** - Which events must survive compaction
//! - **var.rs** - Typed variables, scopes and values
//! - **join.rs** - Compaction and reconciliation of forked branches
//! - **cursor.rs** - Input cursor seam used by rollback
//! - **viz.rs** - Brief/short/long text rendering
//!
//! # Example
//!
//! ```
//! use autoesc_core::{Marker, Output, OutputLog, RawCursor};
//!
//! let log = OutputLog::new().push_marker(Marker::Branch);
//! let log = log.append(Output::text("<b"));
//! let (log, input) = log.rollback(Marker::Branch, &RawCursor::new(">")).unwrap();
//! assert!(log.is_empty());
//! assert_eq!(input.remaining(), "<b>");
//! ```

pub mod cursor;
pub mod error;
pub mod join;
pub mod log;
pub mod marker;
pub mod name;
pub mod output;
pub mod relevance;
pub mod transform;
pub mod tree;
pub mod var;
pub mod viz;

pub use cursor::{InputCursor, RawCursor};
pub use error::{InvariantViolation, JoinError, NameError, Result};
pub use log::OutputLog;
pub use name::ProdName;
pub use output::{BinaryOutput, LimitPattern, Marker, Output, Region, Side, StringOutput};
pub use transform::Transform;
pub use tree::{Node, NodeId, OutputTree, PartialOutput};
pub use var::{Datum, Domain, MultiVariable, Symbol, SymbolType, TypeGuard, Value, VarKey, VarType, Variable};
pub use viz::{DetailLevel, Render};
