//! The x86-64 instruction class table (spec §4.2 rule 1).
//!
//! Scoped to the mnemonics exercised by the concrete scenarios (spec §8)
//! plus the common general-purpose-register subset built on the same
//! encoding shapes: the eight-way ALU group, `mov`, `lea`, `inc`/`dec`,
//! `jmp` (memory-indirect only — forward labels are an explicit
//! non-goal), `push`/`pop`, `nop`, `ret`, `int3`. This is deliberately not
//! the full ISA.

/// One of the eight opcode-group-1 ALU operations, sharing a single
/// encoding shape that differs only in the `/digit` extension and the
/// `r/m,r` / `r,r/m` base opcode (Intel SDM vol. 2, table "Opcode
/// extensions for 1-byte and 2-byte opcodes").
#[derive(Debug, Clone, Copy)]
pub struct AluOp {
    pub name: &'static str,
    pub digit: u8,
    pub base_opcode: u8,
}

pub static ALU_OPS: &[AluOp] = &[
    AluOp { name: "add", digit: 0, base_opcode: 0x00 },
    AluOp { name: "or", digit: 1, base_opcode: 0x08 },
    AluOp { name: "adc", digit: 2, base_opcode: 0x10 },
    AluOp { name: "sbb", digit: 3, base_opcode: 0x18 },
    AluOp { name: "and", digit: 4, base_opcode: 0x20 },
    AluOp { name: "sub", digit: 5, base_opcode: 0x28 },
    AluOp { name: "xor", digit: 6, base_opcode: 0x30 },
    AluOp { name: "cmp", digit: 7, base_opcode: 0x38 },
];

pub fn lookup_alu(mnemonic: &str) -> Option<&'static AluOp> {
    ALU_OPS.iter().find(|op| op.name == mnemonic)
}

/// Mnemonics handled outside the ALU group, each with its own encoding
/// shape in [`crate::encoder`].
pub static OTHER_MNEMONICS: &[&str] =
    &["mov", "lea", "inc", "dec", "jmp", "push", "pop", "nop", "ret", "int3"];

pub fn is_known_mnemonic(mnemonic: &str) -> bool {
    lookup_alu(mnemonic).is_some() || OTHER_MNEMONICS.contains(&mnemonic)
}
