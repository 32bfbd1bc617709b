//! Architecture tables, the variable store and the shared error taxonomy for
//! the interactive x86-64 assembler and single-step execution sandbox.
//!
//! This crate is the root of the workspace: [`inasm64-asm`](../inasm64_asm/index.html)
//! builds the parser and encoder on top of [`arch`], and
//! [`inasm64-runtime`](../inasm64_runtime/index.html) drives a traced child
//! process using the same register descriptors.

pub mod arch;
pub mod error;
pub mod vars;

pub use arch::{RegClass, RegisterId, RegisterInfo};
pub use error::{Error, ErrorKind};
pub use vars::VariableStore;

/// The architectural cap on an encoded x86-64 instruction (spec §6).
pub const MAX_INSTRUCTION_BYTES: usize = 15;

/// Value of the single argument passed back to the running executable when
/// it is re-invoked as the runtime's debuggee (spec §6).
pub const TRAP_MODE_ARGUMENT_VALUE: u32 = 262;

/// Default size, in bytes, of the executable scratch region allocated in
/// the child process (spec §4.3).
pub const DEFAULT_CODE_REGION_SIZE: usize = 8192;

/// Maximum length, in bytes, of a single CLI input line (spec §6).
pub const MAX_COMMAND_LINE_LENGTH: usize = 256;
