//! Leader discovery and basic-block partitioning.
//!
//! Construction runs in two phases. *Discovery* sweeps the requested ranges
//! through the decode oracle, following in-range branch targets with a
//! worklist and collecting the leader set: range starts, branch targets,
//! fall-through addresses after control transfers, and join points where two
//! decode runs meet. *Partitioning* then cuts the decoded instructions into
//! maximal blocks at the leaders.
//!
//! Undecodable bytes never abort construction: they truncate the current
//! block, which later classifies as
//! [`BlockType::Error`](crate::flowchart::BlockType::Error). Cancellation is
//! checked at each new leader taken off the worklist; a cancelled discovery
//! keeps whatever has been decoded so far.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    cancel::CancelToken,
    decode::{AddrRange, DecodeOracle, FlowKind, Instruction},
    flowchart::{BasicBlock, ChartFlags, Terminator},
};

/// External blocks are decoded until their first control transfer; this
/// bounds runs against oracles that never report one.
const MAX_EXTERN_RUN: usize = 10_000;

/// Result of the discovery phase over one set of decode ranges.
pub(crate) struct Discovery {
    /// Successfully decoded instructions, keyed by address.
    insts: BTreeMap<u64, Instruction>,
    /// Block start addresses inside the decode ranges.
    leaders: BTreeSet<u64>,
    /// Transfer targets outside every chart range.
    pub(crate) externals: BTreeSet<u64>,
    /// Addresses where the oracle failed to decode.
    truncated: BTreeSet<u64>,
}

impl Discovery {
    /// Sweeps `decode_ranges`, seeding the worklist with each range start
    /// plus `seeds` (used by range append to carry branch targets from
    /// already-built blocks into the new range).
    ///
    /// `chart_ranges` is the full set of ranges owned by the chart; targets
    /// inside it but outside `decode_ranges` resolve against existing
    /// blocks at link time and are neither followed nor treated as
    /// external.
    pub(crate) fn run<O: DecodeOracle + ?Sized>(
        oracle: &O,
        decode_ranges: &[AddrRange],
        chart_ranges: &[AddrRange],
        seeds: &[u64],
        flags: ChartFlags,
        cancel: &CancelToken,
    ) -> Self {
        let mut disc = Discovery {
            insts: BTreeMap::new(),
            leaders: BTreeSet::new(),
            externals: BTreeSet::new(),
            truncated: BTreeSet::new(),
        };

        let in_decode = |addr: u64| decode_ranges.iter().any(|r| r.contains(addr));
        let in_chart = |addr: u64| chart_ranges.iter().any(|r| r.contains(addr));

        let mut work: Vec<u64> = Vec::new();
        for range in decode_ranges {
            if !range.is_empty() && disc.leaders.insert(range.start) {
                work.push(range.start);
            }
        }
        for &seed in seeds {
            if in_decode(seed) && disc.leaders.insert(seed) {
                work.push(seed);
            }
        }

        while let Some(start) = work.pop() {
            if cancel.is_cancelled() {
                log::debug!("chart discovery cancelled at {start:#x}");
                break;
            }

            let mut addr = start;
            while in_decode(addr) {
                if disc.insts.contains_key(&addr) {
                    // Join point of two decode runs: force a block boundary.
                    disc.leaders.insert(addr);
                    break;
                }

                let Some(inst) = oracle.decode(addr) else {
                    disc.truncated.insert(addr);
                    break;
                };
                let next = addr + inst.size.max(1);

                if inst.flow.is_transfer() {
                    for &target in &inst.targets {
                        if in_decode(target) {
                            if disc.leaders.insert(target) {
                                work.push(target);
                            }
                        } else if !in_chart(target)
                            && !flags.contains(ChartFlags::NO_EXTERNAL_BLOCKS)
                        {
                            disc.externals.insert(target);
                        }
                    }
                    let falls = inst.fall_through(addr);
                    disc.insts.insert(addr, inst);
                    match falls {
                        Some(ft) if in_decode(ft) => {
                            disc.leaders.insert(ft);
                            addr = ft;
                        }
                        _ => break,
                    }
                } else {
                    disc.insts.insert(addr, inst);
                    addr = next;
                }
            }
        }

        disc
    }

    /// Cuts the decoded instructions into maximal blocks, one per in-range
    /// leader, in ascending address order. Successor/predecessor sequences
    /// are left empty; the chart links them once all blocks are in place.
    pub(crate) fn partition(&self) -> Vec<BasicBlock> {
        self.leaders
            .iter()
            .filter_map(|&leader| self.cut_block(leader))
            .collect()
    }

    /// Builds the single block starting at `leader`. Leaders the worklist
    /// never reached (cancelled discovery) produce no block.
    fn cut_block(&self, leader: u64) -> Option<BasicBlock> {
        if !self.insts.contains_key(&leader) {
            if self.truncated.contains(&leader) {
                // The leader itself failed to decode.
                return Some(BasicBlock::new(AddrRange::new(leader, leader), None));
            }
            return None;
        }

        let mut addr = leader;
        loop {
            let inst = &self.insts[&addr];
            let end = addr + inst.size.max(1);

            if inst.flow.is_transfer() {
                let term = Terminator {
                    kind: inst.flow,
                    targets: inst.targets.clone(),
                    fall_through: inst.fall_through(addr),
                };
                return Some(BasicBlock::new(AddrRange::new(leader, end), Some(term)));
            }

            if self.leaders.contains(&end) {
                // Split at the next leader; plain fall-through edge.
                let term = Terminator {
                    kind: FlowKind::Fall,
                    targets: Vec::new(),
                    fall_through: Some(end),
                };
                return Some(BasicBlock::new(AddrRange::new(leader, end), Some(term)));
            }

            if self.truncated.contains(&end) {
                return Some(BasicBlock::new(AddrRange::new(leader, end), None));
            }

            if !self.insts.contains_key(&end) {
                // Fell past the decodable region. The fall-through address
                // stays unresolved unless a later append covers it.
                let term = Terminator {
                    kind: FlowKind::Fall,
                    targets: Vec::new(),
                    fall_through: Some(end),
                };
                return Some(BasicBlock::new(AddrRange::new(leader, end), Some(term)));
            }

            addr = end;
        }
    }
}

/// Decodes one maximal external block at `start`, without following its
/// targets any further.
///
/// The run stops at the first control transfer, at undecodable bytes, or
/// when it falls into one of the chart's own ranges.
pub(crate) fn decode_external<O: DecodeOracle + ?Sized>(
    oracle: &O,
    start: u64,
    chart_ranges: &[AddrRange],
) -> BasicBlock {
    let in_chart = |addr: u64| chart_ranges.iter().any(|r| r.contains(addr));

    let mut addr = start;
    for _ in 0..MAX_EXTERN_RUN {
        if addr != start && in_chart(addr) {
            let term = Terminator {
                kind: FlowKind::Fall,
                targets: Vec::new(),
                fall_through: Some(addr),
            };
            return BasicBlock::new(AddrRange::new(start, addr), Some(term));
        }

        let Some(inst) = oracle.decode(addr) else {
            return BasicBlock::new(AddrRange::new(start, addr), None);
        };
        let end = addr + inst.size.max(1);

        if inst.flow.is_transfer() {
            let term = Terminator {
                kind: inst.flow,
                targets: inst.targets.clone(),
                fall_through: inst.fall_through(addr),
            };
            return BasicBlock::new(AddrRange::new(start, end), Some(term));
        }

        addr = end;
    }

    BasicBlock::new(AddrRange::new(start, addr), None)
}
