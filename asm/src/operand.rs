//! Statement and operand types (spec §3 "Tokenised operand", "Statement").

/// Boolean prefix flags; at most one of `{rep, repe, repne}` is set (spec §3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefixFlags {
    pub lock: bool,
    pub rep: bool,
    pub repe: bool,
    pub repne: bool,
}

impl PrefixFlags {
    pub fn rep_marker(&self) -> Option<&'static str> {
        if self.rep {
            Some("rep_")
        } else if self.repe {
            Some("repe_")
        } else if self.repne {
            Some("repne_")
        } else {
            None
        }
    }
}

/// Which structural shape an operand has (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Register,
    Immediate,
    Memory,
}

/// `(seg, base, index, scale, disp, disp_width_bits)` — spec §3 "memory
/// descriptor". `base`/`index`/`segment` are the raw (lower-cased) register
/// names; the encoder resolves them against the arch table (spec §4.2
/// rule 3, "Memory: segment/base/index are resolved as registers if
/// present").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDescriptor {
    pub segment: Option<String>,
    pub base: Option<String>,
    pub index: Option<String>,
    pub scale: u8,
    pub disp: i32,
    pub disp_width_bits: u16,
}

impl MemoryDescriptor {
    pub fn is_pure_displacement(&self) -> bool {
        self.base.is_none() && self.index.is_none()
    }
}

/// The payload of an [`Operand`]; register and memory fields are raw
/// strings, left unresolved until the encoder validates them (spec §4.2
/// rules 1 and 3).
#[derive(Debug, Clone, PartialEq)]
pub enum OperandPayload {
    Register(String),
    Immediate(i64),
    Memory(MemoryDescriptor),
}

/// One decomposed operand: `(kind, width_bits, payload)` (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub kind: OperandKind,
    pub width_bits: u16,
    pub payload: OperandPayload,
    /// Whether `width_bits` came from an explicit size modifier attached to
    /// this operand, rather than from the width-reconciliation seed/default
    /// rule (spec §4.1 stage 4). The encoder uses this to detect
    /// `OperandSizesMismatch` (spec §4.1, "Asymmetric combinations where
    /// both operands are explicitly sized but sizes differ").
    pub explicit_width: bool,
}

/// A fully parsed assembly statement (spec §3 "Statement").
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub prefixes: PrefixFlags,
    pub mnemonic: String,
    pub operands: Vec<Operand>,
}

impl Statement {
    pub fn operand(&self, index: usize) -> Option<&Operand> {
        self.operands.get(index)
    }
}
