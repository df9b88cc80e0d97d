//! Graph algorithms generic over the [`FlowGraph`](crate::graph::FlowGraph)
//! contract.
//!
//! Every algorithm here uses only the abstract interface (`nsucc`/`succ`),
//! so it works with any concrete graph: flow charts, call graphs, or ad hoc
//! test fixtures.
//!
//! # Key Functions
//!
//! - [`dfs`] - Depth-first pre-order traversal from a start node
//! - [`path_exists`] - Directed reachability query

mod path;

pub use path::{dfs, path_exists, DfsIter};
