//! Basic blocks and their terminal classification.

use strum::{Display, EnumIter};

use crate::{
    decode::{AddrRange, FlowKind},
    graph::NodeSeq,
};

/// Terminal behavior of a basic block, derived on demand from the block's
/// terminating instruction and its successor set.
///
/// Classification is never stored on the block: blocks can gain successors
/// after construction (range append), and recomputing keeps the answer
/// consistent with the current block contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum BlockType {
    /// Ordinary block with ordinary successors.
    Normal,
    /// Ends with an indirect jump whose targets were not statically
    /// resolved.
    IndJump,
    /// Return block.
    Ret,
    /// Returns on some paths and falls through on others.
    CndRet,
    /// Does not return, and lies inside the requested bound.
    Noret,
    /// Does not return, and lies outside the requested bound.
    ENoret,
    /// Reachable block outside the requested bound with ordinary
    /// successors.
    Extern,
    /// Passes execution past the end of the region, or could not be
    /// decoded.
    Error,
}

impl BlockType {
    /// `true` for the two returning classifications.
    #[must_use]
    pub const fn is_ret(self) -> bool {
        matches!(self, BlockType::Ret | BlockType::CndRet)
    }

    /// `true` for the two non-returning classifications.
    #[must_use]
    pub const fn is_noret(self) -> bool {
        matches!(self, BlockType::Noret | BlockType::ENoret)
    }
}

/// The decoded control transfer that ends a block.
///
/// Target *addresses* are kept (not block ids) so that successor lists can
/// be re-resolved when new ranges are appended to the owning chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminator {
    /// Flow behavior of the terminating instruction. [`FlowKind::Fall`]
    /// means the block was split because the next instruction is another
    /// block's leader.
    pub kind: FlowKind,
    /// Statically known transfer target addresses.
    pub targets: Vec<u64>,
    /// Address execution falls through to, for falling-through kinds.
    pub fall_through: Option<u64>,
}

/// A maximal straight-line instruction run inside one flow chart.
///
/// A block belongs to exactly one chart and holds indices (never owning
/// pointers) into that chart's block vector through its `succ`/`pred`
/// sequences. Blocks are created by the chart builder and renumbered only
/// by chart rebuild or by block splicing during range append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub(crate) range: AddrRange,
    /// `None` when the block was truncated by undecodable bytes.
    pub(crate) term: Option<Terminator>,
    pub(crate) succ: NodeSeq,
    pub(crate) pred: NodeSeq,
}

impl BasicBlock {
    pub(crate) fn new(range: AddrRange, term: Option<Terminator>) -> Self {
        BasicBlock {
            range,
            term,
            succ: NodeSeq::new(),
            pred: NodeSeq::new(),
        }
    }

    /// The half-open address range this block covers. Empty for leaders
    /// whose first instruction failed to decode.
    #[must_use]
    pub const fn range(&self) -> AddrRange {
        self.range
    }

    /// Start address of the block (its leader).
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.range.start
    }

    /// End address of the block (exclusive).
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.range.end
    }

    /// Successor block ids, in discovery order.
    #[must_use]
    pub const fn succs(&self) -> &NodeSeq {
        &self.succ
    }

    /// Predecessor block ids. Populated only when the owning chart was
    /// built with [`ChartFlags::COMPUTE_PREDS`](crate::flowchart::ChartFlags::COMPUTE_PREDS).
    #[must_use]
    pub const fn preds(&self) -> &NodeSeq {
        &self.pred
    }

    /// The decoded terminator, or `None` for truncated blocks.
    #[must_use]
    pub const fn terminator(&self) -> Option<&Terminator> {
        self.term.as_ref()
    }
}
