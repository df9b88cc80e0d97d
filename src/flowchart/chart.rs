//! The concrete basic-block flow chart.

use std::collections::BTreeMap;
use std::io::{self, Write};

use bitflags::bitflags;

use crate::{
    cancel::CancelToken,
    decode::{AddrRange, DecodeOracle, FlowKind},
    flowchart::{
        builder::{decode_external, Discovery},
        BasicBlock, BlockType,
    },
    graph::{Color, FlowGraph, NodeId},
    render::escape_gdl,
};

bitflags! {
    /// Builder flags selecting what a [`FlowChart`] computes and renders.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChartFlags: u32 {
        /// Include block labels in rendered output.
        const PRINT_NAMES = 0x0001;
        /// Do not materialize blocks outside the requested bound.
        const NO_EXTERNAL_BLOCKS = 0x0002;
        /// Build predecessor lists as well as successor lists.
        const COMPUTE_PREDS = 0x0004;
        /// Set internally once [`FlowChart::append_range`] has been used;
        /// never supplied by callers.
        const APPENDED = 0x0008;
    }
}

/// A control-flow graph of maximal basic blocks over one logical region.
///
/// The chart owns its blocks exclusively; blocks reference each other by
/// index through their successor/predecessor sequences. Blocks covering the
/// requested ranges ("proper" blocks, counted by [`nproper`](Self::nproper))
/// come first in address order, followed by blocks discovered as successors
/// outside the ranges ("external" blocks, e.g. library trampolines), also
/// in address order.
///
/// Construction never fails: undecodable bytes truncate a block (classified
/// [`BlockType::Error`]) and cancellation yields a partial chart.
///
/// # Examples
///
/// ```rust,ignore
/// let chart = FlowChart::build("main", &oracle, AddrRange::new(ea1, ea2),
///                              ChartFlags::COMPUTE_PREDS, &CancelToken::new());
/// for node in chart.nodes() {
///     println!("{}: {}", chart.blocks()[node.index()].range(),
///              chart.calc_block_type(node));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FlowChart {
    title: String,
    ranges: Vec<AddrRange>,
    bounds: AddrRange,
    flags: ChartFlags,
    blocks: Vec<BasicBlock>,
    nproper: usize,
}

fn envelope(ranges: &[AddrRange]) -> AddrRange {
    let start = ranges.iter().map(|r| r.start).min().unwrap_or(0);
    let end = ranges.iter().map(|r| r.end).max().unwrap_or(0);
    AddrRange::new(start, end)
}

impl FlowChart {
    /// Builds a chart over a single address range.
    pub fn build<O: DecodeOracle + ?Sized>(
        title: impl Into<String>,
        oracle: &O,
        range: AddrRange,
        flags: ChartFlags,
        cancel: &CancelToken,
    ) -> Self {
        Self::build_multirange(title, oracle, &[range], flags, cancel)
    }

    /// Builds a chart over a disjoint union of address ranges.
    pub fn build_multirange<O: DecodeOracle + ?Sized>(
        title: impl Into<String>,
        oracle: &O,
        ranges: &[AddrRange],
        flags: ChartFlags,
        cancel: &CancelToken,
    ) -> Self {
        let mut chart = FlowChart {
            title: title.into(),
            ranges: ranges.to_vec(),
            bounds: envelope(ranges),
            flags: flags - ChartFlags::APPENDED,
            blocks: Vec::new(),
            nproper: 0,
        };
        chart.rebuild(oracle, cancel);
        chart
    }

    /// Discards all blocks and rebuilds the chart from its stored ranges.
    pub fn refresh<O: DecodeOracle + ?Sized>(&mut self, oracle: &O, cancel: &CancelToken) {
        self.rebuild(oracle, cancel);
    }

    fn rebuild<O: DecodeOracle + ?Sized>(&mut self, oracle: &O, cancel: &CancelToken) {
        self.blocks.clear();

        let disc = Discovery::run(oracle, &self.ranges, &self.ranges, &[], self.flags, cancel);
        self.blocks = disc.partition();
        for &ext in &disc.externals {
            self.blocks.push(decode_external(oracle, ext, &self.ranges));
        }

        self.link_edges();
        self.nproper = self.count_proper();
    }

    /// Extends the chart with one more address range without discarding the
    /// existing blocks.
    ///
    /// New blocks are spliced into the block vector at their address
    /// positions; every stored successor/predecessor sequence is renumbered
    /// through the [`NodeSeq`](crate::graph::NodeSeq) primitives, so ids of
    /// unrelated blocks shift predictably and their edges stay intact.
    /// Targets of existing blocks that land in the appended range resolve
    /// into new successor edges without a [`refresh`](Self::refresh).
    pub fn append_range<O: DecodeOracle + ?Sized>(
        &mut self,
        oracle: &O,
        range: AddrRange,
        cancel: &CancelToken,
    ) {
        if range.is_empty() {
            return;
        }
        self.flags |= ChartFlags::APPENDED;

        // External stubs now covered by the appended range are dropped and
        // re-decoded as proper blocks below.
        self.remove_externals_in(range);

        // Branch targets of existing blocks landing in the new range seed
        // the discovery so they become leaders, not mid-block addresses.
        let mut seeds: Vec<u64> = Vec::new();
        for block in &self.blocks {
            if let Some(term) = &block.term {
                seeds.extend(term.targets.iter().copied().filter(|a| range.contains(*a)));
                if let Some(ft) = term.fall_through {
                    if range.contains(ft) {
                        seeds.push(ft);
                    }
                }
            }
        }

        let mut chart_ranges = self.ranges.clone();
        chart_ranges.push(range);
        let disc = Discovery::run(
            oracle,
            &[range],
            &chart_ranges,
            &seeds,
            self.flags,
            cancel,
        );

        self.ranges.push(range);
        self.bounds = envelope(&self.ranges);

        for block in disc.partition() {
            if self.block_at(block.start()).is_some() {
                continue;
            }
            let pos = self.insert_pos(block.start(), 0, self.first_external());
            self.insert_block_at(pos, block);
        }

        for &ext in &disc.externals {
            if self.block_at(ext).is_none() {
                let block = decode_external(oracle, ext, &chart_ranges);
                let pos = self.insert_pos(block.start(), self.first_external(), self.blocks.len());
                self.insert_block_at(pos, block);
            }
        }

        self.relink();
        self.nproper = self.count_proper();
    }

    /// Index of the first external block (== the proper block count).
    fn first_external(&self) -> usize {
        let in_ranges = |addr: u64| self.ranges.iter().any(|r| r.contains(addr));
        self.blocks
            .iter()
            .position(|b| !in_ranges(b.start()))
            .unwrap_or(self.blocks.len())
    }

    /// Insertion index keeping `blocks[section_start..section_end]` sorted
    /// by start address.
    fn insert_pos(&self, start: u64, section_start: usize, section_end: usize) -> usize {
        (section_start..section_end)
            .find(|&i| self.blocks[i].start() > start)
            .unwrap_or(section_end)
    }

    /// Splices `block` in before position `pos`, renumbering every stored
    /// sequence.
    fn insert_block_at(&mut self, pos: usize, block: BasicBlock) {
        let before = NodeId::new(pos);
        for b in &mut self.blocks {
            b.succ.insert_block(before);
            b.pred.insert_block(before);
        }
        self.blocks.insert(pos, block);
    }

    /// Removes the external stubs whose start lies in `range`, renumbering
    /// every stored sequence. Externals are sorted by start, so the victims
    /// form one contiguous id run.
    fn remove_externals_in(&mut self, range: AddrRange) {
        let first_ext = self.first_external();
        let from = (first_ext..self.blocks.len())
            .find(|&i| range.contains(self.blocks[i].start()))
            .unwrap_or(self.blocks.len());
        let to = (from..self.blocks.len())
            .find(|&i| !range.contains(self.blocks[i].start()))
            .unwrap_or(self.blocks.len());
        if from == to {
            return;
        }

        self.blocks.drain(from..to);
        let (from, to) = (NodeId::new(from), NodeId::new(to));
        for b in &mut self.blocks {
            b.succ.remove_blocks(from, to);
            b.pred.remove_blocks(from, to);
        }
    }

    /// Rebuilds all successor/predecessor sequences from scratch.
    fn link_edges(&mut self) {
        for b in &mut self.blocks {
            b.succ = Default::default();
            b.pred = Default::default();
        }
        self.relink();
    }

    /// Resolves every block's terminator addresses against the current
    /// block index and adds the resulting edges. Already-present edges are
    /// kept as-is, so this is safe to run incrementally after a splice.
    fn relink(&mut self) {
        let index: BTreeMap<u64, usize> = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.start(), i))
            .collect();
        let compute_preds = self.flags.contains(ChartFlags::COMPUTE_PREDS);

        for i in 0..self.blocks.len() {
            let Some(term) = self.blocks[i].term.clone() else {
                continue;
            };
            let addrs = term.targets.iter().copied().chain(term.fall_through);
            for addr in addrs {
                if let Some(&j) = index.get(&addr) {
                    self.blocks[i].succ.add_unique(NodeId::new(j));
                    if compute_preds {
                        self.blocks[j].pred.add_unique(NodeId::new(i));
                    }
                }
            }
        }
    }

    fn count_proper(&self) -> usize {
        self.blocks.iter().filter(|b| self.is_proper(b)).count()
    }

    /// `true` if `block` lies fully inside one of the requested ranges.
    fn is_proper(&self, block: &BasicBlock) -> bool {
        self.ranges.iter().any(|r| r.covers(&block.range))
    }

    /// Block id of the block starting exactly at `addr`, if any.
    #[must_use]
    pub fn block_at(&self, addr: u64) -> Option<NodeId> {
        self.blocks
            .iter()
            .position(|b| b.start() == addr)
            .map(NodeId::new)
    }

    /// Classifies the terminal behavior of block `node`.
    ///
    /// The classification is recomputed from the block's terminator and its
    /// current successor set on every call, so it always reflects mutations
    /// made by [`append_range`](Self::append_range).
    #[must_use]
    pub fn calc_block_type(&self, node: NodeId) -> BlockType {
        let block = &self.blocks[node.index()];
        let inside = self.is_proper(block);
        let Some(term) = &block.term else {
            return BlockType::Error;
        };

        match term.kind {
            FlowKind::Return => return BlockType::Ret,
            FlowKind::CondReturn => {
                return if self.resolves(term.fall_through) {
                    BlockType::CndRet
                } else {
                    BlockType::Error
                };
            }
            FlowKind::IndirectJump if term.targets.is_empty() => return BlockType::IndJump,
            _ => {}
        }

        // Falls through, but nothing is there: execution passes the end of
        // the region.
        if let Some(ft) = term.fall_through {
            if self.block_at(ft).is_none() {
                return BlockType::Error;
            }
        }

        // Return-on-one-path: a conditional branch whose taken arm is a
        // return block while the other arm falls through.
        if term.kind == FlowKind::CondJump && self.jumps_to_ret(term.targets.iter().copied()) {
            return BlockType::CndRet;
        }

        if block.succ.is_empty() {
            return if inside {
                BlockType::Noret
            } else {
                BlockType::ENoret
            };
        }
        if !inside {
            return BlockType::Extern;
        }
        BlockType::Normal
    }

    fn resolves(&self, addr: Option<u64>) -> bool {
        addr.and_then(|a| self.block_at(a)).is_some()
    }

    fn jumps_to_ret(&self, targets: impl Iterator<Item = u64>) -> bool {
        targets
            .filter_map(|t| self.block_at(t))
            .any(|id| {
                self.blocks[id.index()]
                    .term
                    .as_ref()
                    .is_some_and(|t| t.kind == FlowKind::Return)
            })
    }

    /// `true` if block `node` classifies as a returning block.
    #[must_use]
    pub fn is_ret_block(&self, node: NodeId) -> bool {
        self.calc_block_type(node).is_ret()
    }

    /// `true` if block `node` classifies as a non-returning block.
    #[must_use]
    pub fn is_noret_block(&self, node: NodeId) -> bool {
        self.calc_block_type(node).is_noret()
    }

    /// The chart title used in rendered output.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Envelope of all requested ranges.
    #[must_use]
    pub const fn bounds(&self) -> AddrRange {
        self.bounds
    }

    /// The requested ranges, in the order they were supplied.
    #[must_use]
    pub fn ranges(&self) -> &[AddrRange] {
        &self.ranges
    }

    /// The chart's builder flags.
    #[must_use]
    pub const fn flags(&self) -> ChartFlags {
        self.flags
    }

    /// `true` if block labels are included in rendered output.
    #[must_use]
    pub const fn print_names(&self) -> bool {
        self.flags.contains(ChartFlags::PRINT_NAMES)
    }

    /// All blocks, proper section first, each section in address order.
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// The block behind id `node`, or `None` for an out-of-range id.
    #[must_use]
    pub fn block(&self, node: NodeId) -> Option<&BasicBlock> {
        self.blocks.get(node.index())
    }

    /// Number of blocks lying fully inside the requested ranges.
    #[must_use]
    pub const fn nproper(&self) -> usize {
        self.nproper
    }
}

impl FlowGraph for FlowChart {
    fn size(&self) -> usize {
        self.blocks.len()
    }

    fn entry(&self) -> NodeId {
        self.ranges
            .first()
            .and_then(|r| self.block_at(r.start))
            .unwrap_or(NodeId::new(0))
    }

    fn nsucc(&self, node: NodeId) -> usize {
        self.blocks[node.index()].succ.len()
    }

    fn npred(&self, node: NodeId) -> usize {
        self.blocks[node.index()].pred.len()
    }

    fn succ(&self, node: NodeId, i: usize) -> NodeId {
        self.blocks[node.index()].succ[i]
    }

    fn pred(&self, node: NodeId, i: usize) -> NodeId {
        self.blocks[node.index()].pred[i]
    }

    fn node_label(&self, node: NodeId) -> Option<String> {
        if !self.print_names() {
            return None;
        }
        let block = &self.blocks[node.index()];
        Some(format!("{} {}", block.range(), self.calc_block_type(node)))
    }

    fn node_color(&self, node: NodeId) -> Color {
        match self.calc_block_type(node) {
            BlockType::Error => Color(0x00FF_C0C0),
            BlockType::Extern | BlockType::ENoret => Color(0x00D8_D8D8),
            _ => Color::DEFAULT,
        }
    }

    fn graph_attributes(&self, out: &mut dyn io::Write) -> io::Result<()> {
        writeln!(out, "title: \"{}\"", escape_gdl(&self.title))?;
        let yes_no = |cond: bool| if cond { "yes" } else { "no" };
        writeln!(out, "// print_names: {}", yes_no(self.print_names()))?;
        writeln!(
            out,
            "// preds: {}",
            yes_no(self.flags.contains(ChartFlags::COMPUTE_PREDS))
        )
    }
}
