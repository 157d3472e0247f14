//! Which events must survive compaction.
//!
//! A value is dead once nothing can read it any more: its scope has closed,
//! or a later value of the same variable in that scope replaces it. Every
//! other event stays relevant.

use crate::output::Output;
use crate::tree::{Node, PartialOutput};
use crate::var::VarKey;

impl Output {
    /// Whether this event, found at `position` in a tree built from its
    /// log, must be kept.
    pub fn is_parse_relevant(&self, position: Node<'_>) -> bool {
        match self {
            Output::Value(value) => {
                let var = value.var();
                scope_still_open(var, position) && !set_later_rootward(var, position)
            }
            Output::Binary(_) | Output::String(_) | Output::Marker(_) => true,
        }
    }
}

impl Node<'_> {
    /// Whether this node's own event must be kept.
    pub fn is_parse_relevant(&self) -> bool {
        match self.kind() {
            PartialOutput::Standalone(output) => output.is_parse_relevant(*self),
            PartialOutput::Root | PartialOutput::BoundedRegion { .. } => true,
        }
    }
}

/// The nearest enclosing scope of `var` has not closed, or there is none.
fn scope_still_open(var: &VarKey, node: Node<'_>) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.left().is_some_and(|left| left.is_scope_of(var)) {
            return n.right().is_none();
        }
        current = n.parent();
    }
    true
}

/// A later value of `var` exists before the enclosing scope of `var` ends.
fn set_later_rootward(var: &VarKey, node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    for later in node.later_siblings() {
        if is_set_of(var, later) || set_later_leafward(var, later) {
            return true;
        }
    }
    if parent.left().is_some_and(|left| left.is_scope_of(var)) {
        return false;
    }
    parent.parent().is_some() && set_later_rootward(var, parent)
}

fn set_later_leafward(var: &VarKey, node: Node<'_>) -> bool {
    node.body().any(|part| is_set_of(var, part))
        || node.body().any(|part| set_later_leafward(var, part))
}

fn is_set_of(var: &VarKey, node: Node<'_>) -> bool {
    node.standalone().is_some_and(|o| o.is_set_of(var))
}
