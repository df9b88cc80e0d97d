//! Node identifier for flow graphs.
//!
//! Node ids are dense, non-negative integers in `[0, size)` of their owning
//! graph. They are stable handles, not addresses: the mapping from machine
//! addresses to ids is owned by the concrete graph (e.g. the flow chart).

use std::fmt;

/// A strongly-typed identifier for a node within a flow graph.
///
/// `NodeId` wraps a `usize` index so that node handles cannot be accidentally
/// mixed with other integer values such as instruction offsets or addresses.
/// Ids are assigned densely starting from 0; after block removal a graph may
/// contain ids for which [`FlowGraph::exists`](crate::graph::FlowGraph::exists)
/// returns `false`.
///
/// # Examples
///
/// ```rust
/// use flowscope::graph::NodeId;
///
/// let n = NodeId::new(3);
/// assert_eq!(n.index(), 3);
/// assert_eq!(format!("{n}"), "n3");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a `NodeId` from a raw index value.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw 0-based index of this node.
    ///
    /// The index can be used directly to address per-node side tables.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Renumbers this id upward by one. Used when a block is spliced in
    /// before this id's position.
    #[inline]
    pub(crate) const fn shift_up(self) -> Self {
        NodeId(self.0 + 1)
    }

    /// Renumbers this id downward by `count`. Used when a block range before
    /// this id's position is removed.
    #[inline]
    pub(crate) const fn shift_down(self, count: usize) -> Self {
        NodeId(self.0 - count)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl From<NodeId> for usize {
    #[inline]
    fn from(node: NodeId) -> Self {
        node.0
    }
}
