//! Architecture tables (spec §2 "Arch tables", §3 "Register descriptor").

mod features;
mod registers;

pub use features::{avx512_supported, avx_supported, osxsave_enabled, sse_level_supported, SseLevel};
pub use registers::{lookup, register_info, RegClass, RegisterId, RegisterInfo, REGISTERS};
