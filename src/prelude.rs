//! Convenient re-exports of the most commonly used types and traits.
//!
//! ```rust,no_run
//! use flowscope::prelude::*;
//!
//! # struct NopOracle;
//! # impl DecodeOracle for NopOracle {
//! #     fn decode(&self, _addr: u64) -> Option<Instruction> { None }
//! # }
//! let oracle = NopOracle;
//! let chart = FlowChart::build(
//!     "sub_401000",
//!     &oracle,
//!     AddrRange::new(0x401000, 0x401080),
//!     ChartFlags::COMPUTE_PREDS,
//!     &CancelToken::new(),
//! );
//! println!("{} proper blocks", chart.nproper());
//! ```

pub use crate::{
    callgraph::{CallGraph, FuncDesc, Xref, XrefConfig, XrefKind, XrefSource},
    decode::{AddrRange, DecodeOracle, FlowKind, Instruction},
    flowchart::{BasicBlock, BlockType, ChartFlags, FlowChart},
    graph::{Color, FlowGraph, NodeId, NodeIter, NodeSeq, NodeSet},
    render::{
        display_gdl, gen_complex_call_chart, gen_flow_graph, gen_gdl, gen_simple_call_chart,
        write_gdl, RenderFlags, ViewerConfig,
    },
    CancelToken, Error, Result,
};
