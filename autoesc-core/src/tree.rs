//! Tree view of a log.
//!
//! A log is flat, but its region markers bracket one another. This module
//! rebuilds the nesting in one pass over the log in chronological order.
//! A region whose right side has not been appended yet stays open, so a
//! log taken in the middle of a parse still yields a tree.
//!
//! The tree uses an index-based arena so that nodes can point at their
//! parent without reference cycles. It is a read-only snapshot and is
//! rebuilt rather than updated.
//!
//! # Example
//!
//! ```
//! use autoesc_core::{BinaryOutput, Output, OutputLog, OutputTree, ProdName, Side};
//!
//! let tag = ProdName::new("Tag").unwrap();
//! let log = OutputLog::from_chronological([
//!     Output::from(BinaryOutput::boundary(Side::Left, tag.clone())),
//!     Output::text("<b>"),
//! ]);
//! let tree = OutputTree::build(&log).unwrap();
//! assert_eq!(tree.dump(), "  <Tag>\n    \"<b>\"\n");
//! ```

use std::fmt;

use tracing::debug;

use crate::error::{InvariantViolation, Result};
use crate::log::OutputLog;
use crate::output::{BinaryOutput, Output, Side};
use crate::viz::{write_indent, DetailLevel, Render};

// ============================================================================
// Core Types
// ============================================================================

/// Index into the tree's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct NodeData {
    parent: Option<NodeId>,
    body: Vec<NodeId>,
    kind: PartialOutput,
}

/// What a tree node stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialOutput {
    /// The forest's container; has no output of its own.
    Root,

    /// A non-region event.
    Standalone(Output),

    /// A region and, in the node's body, everything between its sides.
    /// `right` is `None` while the region is still open.
    BoundedRegion {
        left: BinaryOutput,
        right: Option<BinaryOutput>,
    },
}

/// A log rebuilt as a forest of regions.
#[derive(Debug)]
pub struct OutputTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl OutputTree {
    /// Rebuilds the nesting of `log`.
    ///
    /// Fails only if a right side arrives that does not close the innermost
    /// open region.
    pub fn build(log: &OutputLog) -> Result<Self> {
        let mut builder = TreeBuilder::new();
        let events = log.chronological();
        for output in &events {
            builder.handle_output(output)?;
        }
        let tree = builder.finish();
        debug!(events = events.len(), nodes = tree.len(), "built output tree");
        Ok(tree)
    }

    pub fn root(&self) -> Node<'_> {
        Node { tree: self, id: self.root }
    }

    pub fn get(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then_some(Node { tree: self, id })
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.index()].body.is_empty()
    }

    /// The long-form indented dump used in diagnostics and fixtures.
    pub fn dump(&self) -> String {
        self.root().render_to_string(DetailLevel::Long)
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

// ============================================================================
// Node (navigation handle)
// ============================================================================

/// A handle for navigating an [`OutputTree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t OutputTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'t PartialOutput {
        let tree = self.tree;
        &tree.data(self.id).kind
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind(), PartialOutput::Root)
    }

    /// The enclosing region, or the root.
    pub fn parent(&self) -> Option<Node<'t>> {
        let tree = self.tree;
        tree.data(self.id).parent.map(|id| Node { tree, id })
    }

    /// Nodes nested directly inside this one, in order.
    pub fn body(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id).body.iter().map(move |&id| Node { tree, id })
    }

    pub fn first_child(&self) -> Option<Node<'t>> {
        let tree = self.tree;
        tree.data(self.id).body.first().map(|&id| Node { tree, id })
    }

    pub fn last_child(&self) -> Option<Node<'t>> {
        let tree = self.tree;
        tree.data(self.id).body.last().map(|&id| Node { tree, id })
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        self.later_siblings().next()
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let (siblings, pos) = self.position_in_parent()?;
        let id = *siblings.get(pos.checked_sub(1)?)?;
        Some(Node { tree: self.tree, id })
    }

    /// Siblings after this one, in order.
    pub fn later_siblings(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        let later = match self.position_in_parent() {
            Some((siblings, pos)) => &siblings[pos + 1..],
            None => &[][..],
        };
        later.iter().map(move |&id| Node { tree, id })
    }

    fn position_in_parent(&self) -> Option<(&'t [NodeId], usize)> {
        let tree = self.tree;
        let parent = tree.data(self.id).parent?;
        let siblings = &tree.data(parent).body;
        let pos = siblings.iter().position(|&id| id == self.id)?;
        Some((siblings.as_slice(), pos))
    }

    /// The event of a standalone node.
    pub fn standalone(&self) -> Option<&'t Output> {
        match self.kind() {
            PartialOutput::Standalone(output) => Some(output),
            _ => None,
        }
    }

    /// The opening side of a region node.
    pub fn left(&self) -> Option<&'t BinaryOutput> {
        match self.kind() {
            PartialOutput::BoundedRegion { left, .. } => Some(left),
            _ => None,
        }
    }

    /// The closing side of a closed region node.
    pub fn right(&self) -> Option<&'t BinaryOutput> {
        match self.kind() {
            PartialOutput::BoundedRegion { right, .. } => right.as_ref(),
            _ => None,
        }
    }

    /// True for a region whose right side has not been appended.
    pub fn is_open(&self) -> bool {
        matches!(self.kind(), PartialOutput::BoundedRegion { right: None, .. })
    }

    /// This node and everything nested in it, in log order.
    pub fn descendants(&self) -> Vec<Node<'t>> {
        let mut out = Vec::new();
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let body: Vec<Node<'t>> = node.body().collect();
            stack.extend(body.into_iter().rev());
        }
        out
    }

    /// The events this node stands for, in log order.
    pub fn outputs(&self) -> Vec<Output> {
        let mut out = Vec::new();
        self.collect_outputs(&mut out);
        out
    }

    fn collect_outputs(&self, out: &mut Vec<Output>) {
        match self.kind() {
            PartialOutput::Root => {}
            PartialOutput::Standalone(output) => out.push(output.clone()),
            PartialOutput::BoundedRegion { left, .. } => out.push(Output::Binary(left.clone())),
        }
        for child in self.body() {
            child.collect_outputs(out);
        }
        if let Some(right) = self.right() {
            out.push(Output::Binary(right.clone()));
        }
    }

    fn render_at(&self, indent: usize, lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        let body_indent = match self.kind() {
            PartialOutput::Root => indent,
            PartialOutput::Standalone(output) => {
                write_indent(indent, out)?;
                output.render(lvl, out)?;
                return out.write_char('\n');
            }
            PartialOutput::BoundedRegion { left, .. } => {
                write_indent(indent, out)?;
                left.render(lvl, out)?;
                out.write_char('\n')?;
                indent
            }
        };
        for child in self.body() {
            child.render_at(body_indent + 1, lvl, out)?;
        }
        if let Some(right) = self.right() {
            write_indent(indent, out)?;
            right.render(lvl, out)?;
            out.write_char('\n')?;
        }
        Ok(())
    }
}

/// An indented listing, two spaces per level. The root's children are at
/// level one; a region's body is one level deeper than its sides.
impl Render for Node<'_> {
    fn render(&self, lvl: DetailLevel, out: &mut dyn fmt::Write) -> fmt::Result {
        self.render_at(0, lvl, out)
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", self.kind())
            .finish()
    }
}

impl fmt::Display for OutputTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root().render(DetailLevel::Long, f)
    }
}

// ============================================================================
// TreeBuilder
// ============================================================================

/// Builds a tree from outputs in chronological order.
struct TreeBuilder {
    nodes: Vec<NodeData>,
    /// Open regions, innermost last, above the root.
    stack: Vec<NodeId>,
    root: NodeId,
}

impl TreeBuilder {
    fn new() -> Self {
        let root = NodeData {
            parent: None,
            body: Vec::new(),
            kind: PartialOutput::Root,
        };
        TreeBuilder {
            nodes: vec![root],
            stack: vec![NodeId::new(0)],
            root: NodeId::new(0),
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.root)
    }

    fn push_node(&mut self, kind: PartialOutput) -> Result<NodeId> {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            parent: None,
            body: Vec::new(),
            kind,
        });
        self.adopt(self.current(), id)?;
        Ok(id)
    }

    /// Sets `child`'s parent; a node is adopted at most once.
    fn adopt(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root {
            return Err(InvariantViolation::RootReparented);
        }
        let data = &mut self.nodes[child.index()];
        if data.parent.is_some() {
            return Err(InvariantViolation::ParentAlreadySet { node: child });
        }
        data.parent = Some(parent);
        self.nodes[parent.index()].body.push(child);
        Ok(())
    }

    fn handle_output(&mut self, output: &Output) -> Result<()> {
        let Some(b) = output.as_binary() else {
            self.push_node(PartialOutput::Standalone(output.clone()))?;
            return Ok(());
        };
        match b.side() {
            Side::Left => {
                let id = self.push_node(PartialOutput::BoundedRegion {
                    left: b.clone(),
                    right: None,
                })?;
                self.stack.push(id);
            }
            Side::Right => {
                let top = self.current();
                match &mut self.nodes[top.index()].kind {
                    PartialOutput::BoundedRegion { left, right } if left.is_other_side(b) => {
                        *right = Some(b.clone());
                        self.stack.pop();
                    }
                    _ => {
                        return Err(InvariantViolation::OrphanedRightSide { output: b.clone() });
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> OutputTree {
        OutputTree {
            nodes: self.nodes,
            root: self.root,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::ProdName;
    use crate::output::Marker;
    use crate::transform::Transform;

    fn bound(side: Side, name: &str) -> Output {
        BinaryOutput::boundary(side, ProdName::new(name).unwrap()).into()
    }

    fn tree_of(outputs: Vec<Output>) -> OutputTree {
        OutputTree::build(&OutputLog::from_chronological(outputs)).unwrap()
    }

    #[test]
    fn test_empty_log() {
        let tree = tree_of(vec![]);
        assert!(tree.is_empty());
        assert!(tree.root().is_root());
        assert_eq!(tree.dump(), "");
    }

    #[test]
    fn test_nested_regions() {
        let tree = tree_of(vec![
            bound(Side::Left, "A"),
            Output::text("x"),
            bound(Side::Left, "B"),
            Output::text("y"),
            bound(Side::Right, "B"),
            bound(Side::Right, "A"),
            Output::text("z"),
        ]);

        let a = tree.root().first_child().unwrap();
        assert_eq!(a.left().unwrap().to_string(), "<A>");
        assert_eq!(a.right().unwrap().to_string(), "</A>");
        let b = a.last_child().unwrap();
        assert_eq!(b.parent().unwrap(), a);
        assert_eq!(b.prev_sibling().unwrap().standalone(), Some(&Output::text("x")));
        assert_eq!(a.next_sibling().unwrap().standalone(), Some(&Output::text("z")));
        assert!(a.prev_sibling().is_none());
        assert_eq!(tree.root().descendants().len(), 6);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_open_regions_stay_open() {
        let tree = tree_of(vec![
            bound(Side::Left, "A"),
            BinaryOutput::embed(Side::Left, Transform::Html).into(),
            Output::text("x"),
        ]);
        let a = tree.root().first_child().unwrap();
        let embed = a.first_child().unwrap();
        assert!(a.is_open());
        assert!(embed.is_open());
        assert_eq!(tree.dump(), "  <A>\n    html\n      \"x\"\n");
    }

    #[test]
    fn test_orphaned_right_side() {
        let log = OutputLog::from_chronological([Output::text("x"), bound(Side::Right, "A")]);
        let err = OutputTree::build(&log).unwrap_err();
        assert!(matches!(err, InvariantViolation::OrphanedRightSide { .. }));
        assert_eq!(err.to_string(), "internal error: orphaned right side </A>");
    }

    #[test]
    fn test_mismatched_right_side_is_orphaned() {
        let log = OutputLog::from_chronological([
            bound(Side::Left, "A"),
            bound(Side::Left, "B"),
            bound(Side::Right, "A"),
        ]);
        assert!(OutputTree::build(&log).is_err());
    }

    #[test]
    fn test_adopt_once() {
        let mut builder = TreeBuilder::new();
        let id = builder.push_node(PartialOutput::Standalone(Marker::Loop.into())).unwrap();
        assert_eq!(
            builder.adopt(builder.root, id),
            Err(InvariantViolation::ParentAlreadySet { node: id })
        );
        assert_eq!(builder.adopt(id, builder.root), Err(InvariantViolation::RootReparented));
    }

    #[test]
    fn test_outputs_round_trip() {
        let events = vec![
            bound(Side::Left, "A"),
            Output::text("x"),
            bound(Side::Right, "A"),
            Marker::Branch.into(),
            bound(Side::Left, "B"),
        ];
        let tree = tree_of(events.clone());
        assert_eq!(tree.root().outputs(), events);
    }
}
