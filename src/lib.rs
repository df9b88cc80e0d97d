// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # flowscope
//!
//! A polymorphic control-flow-graph library for machine code: build,
//! query, classify and externally render flow graphs for a function or an
//! arbitrary set of address ranges.
//!
//! `flowscope` deliberately does *not* disassemble anything itself. The
//! flow-chart builder consumes an address range plus a "decode one
//! instruction, discover its successors" oracle supplied by the host
//! (see [`decode::DecodeOracle`]); graph layout and drawing are likewise
//! external — the crate emits a normalized textual graph description and
//! can launch a configured viewer process on it.
//!
//! ## Architecture
//!
//! - [`graph`] - The abstract graph interface every consumer programs
//!   against: node-id space, adjacency, label/color hooks, the alive-node
//!   iterator and generic reachability queries
//! - [`decode`] - The decode-oracle contract and address ranges
//! - [`flowchart`] - The concrete basic-block flow chart: leader
//!   discovery, maximal-block partitioning, terminal classification, and
//!   incremental range append
//! - [`callgraph`] - Synthetic call/cross-reference graphs over an
//!   external xref source
//! - [`render`] - GDL export and the external-viewer bridge
//! - [`Error`] and [`Result`] - Error handling for the export path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowscope::prelude::*;
//!
//! # struct MyOracle;
//! # impl DecodeOracle for MyOracle {
//! #     fn decode(&self, _addr: u64) -> Option<Instruction> { None }
//! # }
//! let oracle = MyOracle;
//! let chart = FlowChart::build(
//!     "sub_401000",
//!     &oracle,
//!     AddrRange::new(0x401000, 0x401080),
//!     ChartFlags::COMPUTE_PREDS,
//!     &CancelToken::new(),
//! );
//!
//! for node in chart.nodes() {
//!     println!("block {node}: {}", chart.calc_block_type(node));
//! }
//!
//! gen_gdl(&chart, "sub_401000.gdl".as_ref(), &CancelToken::new())?;
//! # Ok::<(), flowscope::Error>(())
//! ```
//!
//! ## Failure model
//!
//! Chart construction never fails: undecodable bytes truncate the current
//! block (classified [`flowchart::BlockType::Error`]) and construction
//! continues; cooperative cancellation through [`CancelToken`] yields a
//! partial chart. Only the export/render path returns [`Error`].

pub mod callgraph;
pub(crate) mod cancel;
pub mod decode;
pub(crate) mod error;
pub mod flowchart;
pub mod graph;
pub mod prelude;
pub mod render;

pub use cancel::CancelToken;
pub use error::Error;

/// Result alias used by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;
