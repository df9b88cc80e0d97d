//! Flow-chart construction over decoded machine code.
//!
//! This module turns a byte range (or a disjoint union of ranges) belonging
//! to one logical function into a CFG of maximal basic blocks, driven by an
//! external [`DecodeOracle`](crate::decode::DecodeOracle).
//!
//! # Key Components
//!
//! - [`FlowChart`] - The concrete graph; implements
//!   [`FlowGraph`](crate::graph::FlowGraph)
//! - [`BasicBlock`] - Address-range node with successor/predecessor lists
//! - [`BlockType`] - On-demand terminal classification
//! - [`ChartFlags`] - Builder flag bitmask
//!
//! # Lifecycle
//!
//! A chart is built over its initial range(s), can be fully rebuilt with
//! [`FlowChart::refresh`], and can be extended in place with
//! [`FlowChart::append_range`], which splices new blocks into the block
//! vector while renumbering every stored id sequence.

mod block;
mod builder;
mod chart;

pub use block::{BasicBlock, BlockType, Terminator};
pub use chart::{ChartFlags, FlowChart};
