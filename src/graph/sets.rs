//! Node set and node sequence containers.
//!
//! [`NodeSet`] is an ordered set of unique node ids used for membership
//! reasoning (visited sets, reachability frontiers, set algebra). [`NodeSeq`]
//! is an ordered, possibly-duplicated sequence used for per-block successor
//! and predecessor lists.
//!
//! `NodeSeq` additionally carries the two structural renumbering primitives
//! every stored sequence must go through when a graph's block list is
//! mutated: [`NodeSeq::insert_block`] and [`NodeSeq::remove_blocks`]. A
//! concrete graph that splices blocks in or out of its vector applies these
//! to every successor and predecessor sequence it owns, keeping stored ids
//! numerically consistent with the new positions.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;

use crate::graph::{FlowGraph, NodeId};

/// An ordered set of unique node ids.
///
/// Backed by a [`BTreeSet`], so iteration and [`first`](Self::first) follow
/// ascending id order. Set operations are O(log n) per element over
/// function-sized graphs (tens to low thousands of nodes).
///
/// # Examples
///
/// ```rust
/// use flowscope::graph::{NodeId, NodeSet};
///
/// let mut s = NodeSet::new();
/// assert!(s.add(NodeId::new(3)));
/// assert!(!s.add(NodeId::new(3)));
/// assert_eq!(s.first(), Some(NodeId::new(3)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet(BTreeSet<NodeId>);

impl NodeSet {
    /// Creates an empty node set.
    #[must_use]
    pub fn new() -> Self {
        NodeSet(BTreeSet::new())
    }

    /// Creates a set holding every alive node of `graph`.
    #[must_use]
    pub fn alive<G: FlowGraph + ?Sized>(graph: &G) -> Self {
        let mut set = NodeSet::new();
        for i in 0..graph.size() {
            let node = NodeId::new(i);
            if graph.exists(node) {
                set.0.insert(node);
            }
        }
        set
    }

    /// Inserts a node. Returns `true` if it was newly inserted.
    pub fn add(&mut self, node: NodeId) -> bool {
        self.0.insert(node)
    }

    /// Removes a node if present.
    pub fn sub(&mut self, node: NodeId) {
        self.0.remove(&node);
    }

    /// Inserts every node of `other`.
    pub fn add_set(&mut self, other: &NodeSet) {
        for &node in &other.0 {
            self.0.insert(node);
        }
    }

    /// Removes every node of `other`.
    pub fn sub_set(&mut self, other: &NodeSet) {
        for &node in &other.0 {
            self.0.remove(&node);
        }
    }

    /// Membership test.
    #[must_use]
    pub fn has(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }

    /// Keeps only nodes that are also present in `other`.
    pub fn intersect(&mut self, other: &NodeSet) {
        self.0.retain(|node| other.has(*node));
    }

    /// Drains the set into `out` in ascending id order.
    pub fn extract(&mut self, out: &mut NodeSeq) {
        while let Some(node) = self.0.pop_first() {
            out.add(node);
        }
    }

    /// Returns the smallest node id, or `None` if the set is empty.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.0.first().copied()
    }

    /// Number of nodes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the set holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the set in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }
}

impl From<NodeId> for NodeSet {
    fn from(node: NodeId) -> Self {
        let mut set = NodeSet::new();
        set.add(node);
        set
    }
}

impl FromIterator<NodeId> for NodeSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        NodeSet(iter.into_iter().collect())
    }
}

impl fmt::Display for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for node in &self.0 {
            write!(f, "{sep}{}", node.index())?;
            sep = " ";
        }
        Ok(())
    }
}

/// An ordered sequence of node ids, used for successor/predecessor lists.
///
/// Unlike [`NodeSet`], order is significant and duplicates are representable
/// (callers that need uniqueness use [`add_unique`](Self::add_unique)).
///
/// # Renumbering
///
/// The two structural primitives [`insert_block`](Self::insert_block) and
/// [`remove_blocks`](Self::remove_blocks) are the only accepted way to keep a
/// sequence consistent when the owning graph's block vector is mutated; see
/// the module documentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSeq(Vec<NodeId>);

impl NodeSeq {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        NodeSeq(Vec::new())
    }

    /// Returns the position of `node` in the sequence, if present.
    #[must_use]
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.0.iter().position(|&n| n == node)
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.index_of(node).is_some()
    }

    /// Appends a node, duplicates allowed.
    pub fn add(&mut self, node: NodeId) {
        self.0.push(node);
    }

    /// Appends a node unless it is already present. Returns `true` if added.
    pub fn add_unique(&mut self, node: NodeId) -> bool {
        if self.contains(node) {
            return false;
        }
        self.add(node);
        true
    }

    /// Appends every node of `other` that is not already present.
    pub fn add_unique_seq(&mut self, other: &NodeSeq) {
        for &node in &other.0 {
            self.add_unique(node);
        }
    }

    /// Removes and returns the last node, or `None` if empty.
    pub fn pop(&mut self) -> Option<NodeId> {
        self.0.pop()
    }

    /// Renumbers for a block inserted before position `before`: every stored
    /// id ≥ `before` is shifted up by one, ids below are unchanged. The
    /// sequence itself gains no element.
    pub fn insert_block(&mut self, before: NodeId) {
        for node in &mut self.0 {
            if *node >= before {
                *node = node.shift_up();
            }
        }
    }

    /// Renumbers for removal of the block range `[from, to)`: ids inside the
    /// range are dropped from the sequence, ids ≥ `to` are shifted down by
    /// the removed count.
    pub fn remove_blocks(&mut self, from: NodeId, to: NodeId) {
        let count = to.index() - from.index();
        self.0.retain(|node| *node < from || *node >= to);
        for node in &mut self.0 {
            if *node >= to {
                *node = node.shift_down(count);
            }
        }
    }

    /// Number of nodes in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the sequence holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the sequence in stored order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }
}

impl Deref for NodeSeq {
    type Target = [NodeId];

    fn deref(&self) -> &[NodeId] {
        &self.0
    }
}

impl FromIterator<NodeId> for NodeSeq {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        NodeSeq(iter.into_iter().collect())
    }
}

impl fmt::Display for NodeSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for node in &self.0 {
            write!(f, "{sep}{}", node.index())?;
            sep = " ";
        }
        Ok(())
    }
}
