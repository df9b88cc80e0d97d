//! Depth-first traversal and directed reachability.

use crate::graph::{FlowGraph, NodeId, NodeSet};

/// Depth-first pre-order iterator over the nodes reachable from a start
/// node, following successor edges only.
///
/// Each reachable node is yielded exactly once; a [`NodeSet`] visited set
/// guarantees termination on cyclic graphs. Worst case O(V + E).
pub struct DfsIter<'g, G: FlowGraph + ?Sized> {
    graph: &'g G,
    stack: Vec<NodeId>,
    visited: NodeSet,
}

impl<'g, G: FlowGraph + ?Sized> DfsIter<'g, G> {
    fn new(graph: &'g G, start: NodeId) -> Self {
        let mut visited = NodeSet::new();
        let mut stack = Vec::new();
        if start.index() < graph.size() && graph.exists(start) {
            visited.add(start);
            stack.push(start);
        }
        DfsIter {
            graph,
            stack,
            visited,
        }
    }
}

impl<G: FlowGraph + ?Sized> Iterator for DfsIter<'_, G> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;

        // Push unvisited successors in reverse so they pop in edge order.
        for i in (0..self.graph.nsucc(node)).rev() {
            let succ = self.graph.succ(node, i);
            if self.visited.add(succ) {
                self.stack.push(succ);
            }
        }

        Some(node)
    }
}

/// Returns a depth-first pre-order iterator starting at `start`.
///
/// A `start` outside the id space, or one that does not exist, yields an
/// empty iterator.
pub fn dfs<G: FlowGraph + ?Sized>(graph: &G, start: NodeId) -> DfsIter<'_, G> {
    DfsIter::new(graph, start)
}

/// `true` if a directed path from `m` to `n` exists, following successor
/// edges only.
///
/// `path_exists(m, m)` is `true` for every alive `m`. The query is read-only
/// and independent of how the concrete graph stores its edges; note that
/// reachability is directional, so `path_exists(a, b)` says nothing about
/// `path_exists(b, a)`.
pub fn path_exists<G: FlowGraph + ?Sized>(graph: &G, m: NodeId, n: NodeId) -> bool {
    if m == n {
        return m.index() < graph.size() && graph.exists(m);
    }
    dfs(graph, m).any(|node| node == n)
}
