//! The instruction decode oracle consumed by the flow-chart builder.
//!
//! The builder never decodes bytes itself. It asks an external collaborator
//! — the [`DecodeOracle`] — one question per address: how long is the
//! instruction there, how does it affect control flow, and which target
//! addresses are statically known. Everything about instruction encodings,
//! jump-table recovery and function-boundary recognition stays on the
//! oracle's side of this seam.
//!
//! Whether a computed jump counts as "statically resolved" is the oracle's
//! policy, not the graph core's: a [`FlowKind::IndirectJump`] instruction
//! reported with a non-empty target list is treated as resolved, one with
//! an empty list produces the indirect-jump block classification.

/// How an instruction affects control flow.
///
/// This is the entire flow vocabulary the chart builder understands; the
/// oracle maps its architecture's opcodes onto these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Execution continues at the next instruction.
    Fall,
    /// Always transfers to the target address.
    Jump,
    /// Transfers to the target address or falls through.
    CondJump,
    /// Transfers through a computed target. The statically recovered
    /// targets, if any, are in [`Instruction::targets`].
    IndirectJump,
    /// Returns from the current function.
    Return,
    /// Returns on some paths and falls through on others (conditional
    /// return opcode).
    CondReturn,
    /// Halts or never returns (e.g. a trap, or a call to a noreturn
    /// routine folded into one opcode by the oracle).
    Stop,
}

impl FlowKind {
    /// `true` if execution can continue at the next sequential address.
    #[must_use]
    pub const fn falls_through(self) -> bool {
        matches!(self, FlowKind::Fall | FlowKind::CondJump | FlowKind::CondReturn)
    }

    /// `true` if this kind terminates a basic block.
    #[must_use]
    pub const fn is_transfer(self) -> bool {
        !matches!(self, FlowKind::Fall)
    }
}

/// One decoded instruction as reported by the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Instruction length in address units. Always non-zero for a
    /// successfully decoded instruction.
    pub size: u64,
    /// Control-flow behavior.
    pub flow: FlowKind,
    /// Statically known transfer targets. Empty for non-transfer
    /// instructions and for unresolved indirect jumps.
    pub targets: Vec<u64>,
}

impl Instruction {
    /// Address of the next sequential instruction, when this one can fall
    /// through.
    #[must_use]
    pub fn fall_through(&self, addr: u64) -> Option<u64> {
        self.flow.falls_through().then(|| addr + self.size)
    }
}

/// Oracle interface: decode one instruction and describe its successors.
///
/// Returning `None` means the bytes at `addr` do not form a valid
/// instruction. The builder treats that as a block truncation, not as a
/// construction failure.
pub trait DecodeOracle {
    /// Decodes the instruction at `addr`.
    fn decode(&self, addr: u64) -> Option<Instruction>;
}

impl<O: DecodeOracle + ?Sized> DecodeOracle for &O {
    fn decode(&self, addr: u64) -> Option<Instruction> {
        (**self).decode(addr)
    }
}

/// A half-open address range `[start, end)`.
///
/// Used both for the bounds a chart is requested over and for the extent of
/// each basic block. Empty ranges (`start == end`) are valid and describe
/// zero-length blocks produced by undecodable leaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddrRange {
    /// Inclusive lower bound.
    pub start: u64,
    /// Exclusive upper bound.
    pub end: u64,
}

impl AddrRange {
    /// Creates a range; `start` must not exceed `end`.
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        AddrRange { start, end }
    }

    /// `true` if `addr` lies inside the range.
    #[must_use]
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }

    /// `true` if `other` lies fully inside this range.
    #[must_use]
    pub const fn covers(&self, other: &AddrRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// `true` if the range spans no addresses.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Number of address units spanned.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

impl std::fmt::Display for AddrRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}..{:#x}", self.start, self.end)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_kind_fall_through() {
        assert!(FlowKind::Fall.falls_through());
        assert!(FlowKind::CondJump.falls_through());
        assert!(FlowKind::CondReturn.falls_through());
        assert!(!FlowKind::Jump.falls_through());
        assert!(!FlowKind::Return.falls_through());
        assert!(!FlowKind::IndirectJump.falls_through());
        assert!(!FlowKind::Stop.falls_through());
    }

    #[test]
    fn test_flow_kind_transfer() {
        assert!(!FlowKind::Fall.is_transfer());
        assert!(FlowKind::CondJump.is_transfer());
        assert!(FlowKind::Stop.is_transfer());
    }

    #[test]
    fn test_instruction_fall_through_addr() {
        let i = Instruction {
            size: 2,
            flow: FlowKind::CondJump,
            targets: vec![0x40],
        };
        assert_eq!(i.fall_through(0x10), Some(0x12));

        let j = Instruction {
            size: 2,
            flow: FlowKind::Jump,
            targets: vec![0x40],
        };
        assert_eq!(j.fall_through(0x10), None);
    }

    #[test]
    fn test_addr_range() {
        let r = AddrRange::new(0x10, 0x20);
        assert!(r.contains(0x10));
        assert!(r.contains(0x1f));
        assert!(!r.contains(0x20));
        assert!(r.covers(&AddrRange::new(0x12, 0x18)));
        assert!(!r.covers(&AddrRange::new(0x12, 0x28)));
        assert_eq!(r.len(), 0x10);
        assert!(AddrRange::new(5, 5).is_empty());
    }

    #[test]
    fn test_addr_range_display() {
        assert_eq!(format!("{}", AddrRange::new(0x10, 0x2a)), "0x10..0x2a");
    }
}
