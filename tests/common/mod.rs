//! Shared test fixtures: a tiny byte-coded ISA and its decode oracle.
//!
//! Opcodes:
//!
//! | byte | mnemonic | size  | flow                              |
//! |------|----------|-------|-----------------------------------|
//! | 0x00 | nop      | 1     | fall through                      |
//! | 0x01 | ret      | 1     | return                            |
//! | 0x02 | jmp a    | 2     | jump to absolute byte address `a` |
//! | 0x03 | jcc a    | 2     | conditional jump to `a`           |
//! | 0x04 | halt     | 1     | stop (no return)                  |
//! | 0x05 | retc     | 1     | conditional return                |
//! | 0x06 | ijmp     | 1     | indirect jump, unresolved         |
//! | 0x07 | tbl n a… | 2 + n | indirect jump, `n` resolved targets |
//!
//! Any other byte fails to decode.

use flowscope::prelude::*;

/// Byte-slice-backed oracle for the toy ISA above.
pub struct ToyIsa {
    base: u64,
    code: Vec<u8>,
}

impl ToyIsa {
    pub fn new(base: u64, code: &[u8]) -> Self {
        ToyIsa {
            base,
            code: code.to_vec(),
        }
    }
}

impl DecodeOracle for ToyIsa {
    fn decode(&self, addr: u64) -> Option<Instruction> {
        let idx = usize::try_from(addr.checked_sub(self.base)?).ok()?;
        let opcode = *self.code.get(idx)?;
        let imm = |at: usize| self.code.get(at).map(|&b| u64::from(b));

        let inst = match opcode {
            0x00 => Instruction {
                size: 1,
                flow: FlowKind::Fall,
                targets: vec![],
            },
            0x01 => Instruction {
                size: 1,
                flow: FlowKind::Return,
                targets: vec![],
            },
            0x02 => Instruction {
                size: 2,
                flow: FlowKind::Jump,
                targets: vec![imm(idx + 1)?],
            },
            0x03 => Instruction {
                size: 2,
                flow: FlowKind::CondJump,
                targets: vec![imm(idx + 1)?],
            },
            0x04 => Instruction {
                size: 1,
                flow: FlowKind::Stop,
                targets: vec![],
            },
            0x05 => Instruction {
                size: 1,
                flow: FlowKind::CondReturn,
                targets: vec![],
            },
            0x06 => Instruction {
                size: 1,
                flow: FlowKind::IndirectJump,
                targets: vec![],
            },
            0x07 => {
                let n = usize::try_from(imm(idx + 1)?).ok()?;
                let targets = (0..n)
                    .map(|k| imm(idx + 2 + k))
                    .collect::<Option<Vec<u64>>>()?;
                Instruction {
                    size: 2 + n as u64,
                    flow: FlowKind::IndirectJump,
                    targets,
                }
            }
            _ => return None,
        };
        Some(inst)
    }
}
