//! Graph export and external rendering.
//!
//! Everything here programs against the abstract
//! [`FlowGraph`](crate::graph::FlowGraph) interface, so any concrete graph
//! — flow chart, call graph, or a caller-supplied implementation — exports
//! identically.
//!
//! # Key Components
//!
//! - [`write_gdl`] / [`gen_gdl`] - Serialize a graph to GDL
//! - [`GdlDocument`] - Minimal reader for round-trip verification
//! - [`ViewerConfig`] / [`display_gdl`] - Launch the external viewer
//! - [`gen_flow_graph`], [`gen_simple_call_chart`],
//!   [`gen_complex_call_chart`] - High-level build-and-display operations
//!   driven by [`RenderFlags`]

mod charts;
mod gdl;
mod viewer;

pub use charts::{gen_complex_call_chart, gen_flow_graph, gen_simple_call_chart, RenderFlags};
pub use gdl::{escape_gdl, gen_gdl, write_gdl, GdlDocument};
pub use viewer::{display_gdl, ViewerConfig};
