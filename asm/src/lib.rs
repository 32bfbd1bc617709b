//! Tokenises and encodes one line of assembly at a time (spec §4.1, §4.2).
//!
//! [`parser::parse`] turns a line into a [`operand::Statement`]; [`encoder::encode`]
//! resolves that statement's registers and operand widths against the
//! architecture table and emits up to [`inasm64::MAX_INSTRUCTION_BYTES`] of
//! machine code.

pub mod encoder;
pub mod instructions;
mod int_literal;
mod memory_expr;
pub mod operand;
pub mod parser;
mod tokeniser;

pub use encoder::{encode, EncodedInstruction};
pub use operand::{MemoryDescriptor, Operand, OperandKind, OperandPayload, PrefixFlags, Statement};
pub use parser::parse;
