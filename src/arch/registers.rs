//! The register table (spec §3 "Register descriptor", §4.1 stage 4).
//!
//! Grounded on `original_source/inasm64/ia64.h`: a flat, ordered list of
//! every architectural register, looked up by lowercase name with a linear
//! scan (`GetRegisterInfo`) — spec §3 says as much ("Lookups by lowercase
//! name return descriptors in O(table size)"), so this keeps the original's
//! scan instead of reaching for a hash map. Variant names are deliberately
//! lower-case, matching the original's own comment ("deliberately not
//! following the convention of using a 'k' prefix for enums, to be able to
//! keep register 'natural' names") — which also lets the `EnumFromStr`
//! derive from the `util-derive` crate do exact, case-matching name
//! resolution for free.

use util::{EnumFromStr, InteropGetName};
use util_derive::{EnumFromStr, InteropGetName};

/// The broad category a register belongs to (spec §3).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum RegClass {
    Gpr,
    Xmm,
    Ymm,
    Zmm,
    Segment,
    Flags,
}

/// Every architectural register the assembler and runtime know about.
///
/// Names are intentionally lower-case identifiers (`rax`, not `Rax`) so that
/// [`EnumFromStr::from_str`] resolves exactly the spelling a parsed,
/// already-lower-cased assembly line would contain.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, InteropGetName, EnumFromStr)]
pub enum RegisterId {
    al, ah, bl, bh, cl, ch, dl, dh,
    sil, dil, spl, bpl,
    r8b, r9b, r10b, r11b, r12b, r13b, r14b, r15b,

    ax, bx, cx, dx, si, di, sp, bp,
    r8w, r9w, r10w, r11w, r12w, r13w, r14w, r15w,

    eax, ebx, ecx, edx, esi, edi, esp, ebp,
    r8d, r9d, r10d, r11d, r12d, r13d, r14d, r15d,

    rax, rbx, rcx, rdx, rsi, rdi, rsp, rbp,
    r8, r9, r10, r11, r12, r13, r14, r15,

    xmm0, xmm1, xmm2, xmm3, xmm4, xmm5, xmm6, xmm7,
    xmm8, xmm9, xmm10, xmm11, xmm12, xmm13, xmm14, xmm15,

    ymm0, ymm1, ymm2, ymm3, ymm4, ymm5, ymm6, ymm7,
    ymm8, ymm9, ymm10, ymm11, ymm12, ymm13, ymm14, ymm15,

    zmm0, zmm1, zmm2, zmm3, zmm4, zmm5, zmm6, zmm7,
    zmm8, zmm9, zmm10, zmm11, zmm12, zmm13, zmm14, zmm15,

    cs, ds, es, ss, fs, gs,

    eflags,
    rip,
}

/// `(class, id, enclosing_id, width_bits, name)` — spec §3 "Register descriptor".
#[derive(Clone, Copy, Debug)]
pub struct RegisterInfo {
    pub class: RegClass,
    pub id: RegisterId,
    pub enclosing_id: RegisterId,
    pub width_bits: u16,
    pub name: &'static str,
}

macro_rules! reg {
    ($id:ident, $class:ident, $width:expr, $enclosing:ident) => {
        RegisterInfo {
            class: RegClass::$class,
            id: RegisterId::$id,
            enclosing_id: RegisterId::$enclosing,
            width_bits: $width,
            name: stringify!($id),
        }
    };
}

/// The full register table, ordered to match [`RegisterId`]'s discriminants
/// 1:1 so [`register_info`] can index directly instead of scanning.
pub static REGISTERS: &[RegisterInfo] = &[
    reg!(al, Gpr, 8, rax), reg!(ah, Gpr, 8, rax), reg!(bl, Gpr, 8, rbx), reg!(bh, Gpr, 8, rbx),
    reg!(cl, Gpr, 8, rcx), reg!(ch, Gpr, 8, rcx), reg!(dl, Gpr, 8, rdx), reg!(dh, Gpr, 8, rdx),
    reg!(sil, Gpr, 8, rsi), reg!(dil, Gpr, 8, rdi), reg!(spl, Gpr, 8, rsp), reg!(bpl, Gpr, 8, rbp),
    reg!(r8b, Gpr, 8, r8), reg!(r9b, Gpr, 8, r9), reg!(r10b, Gpr, 8, r10), reg!(r11b, Gpr, 8, r11),
    reg!(r12b, Gpr, 8, r12), reg!(r13b, Gpr, 8, r13), reg!(r14b, Gpr, 8, r14), reg!(r15b, Gpr, 8, r15),

    reg!(ax, Gpr, 16, rax), reg!(bx, Gpr, 16, rbx), reg!(cx, Gpr, 16, rcx), reg!(dx, Gpr, 16, rdx),
    reg!(si, Gpr, 16, rsi), reg!(di, Gpr, 16, rdi), reg!(sp, Gpr, 16, rsp), reg!(bp, Gpr, 16, rbp),
    reg!(r8w, Gpr, 16, r8), reg!(r9w, Gpr, 16, r9), reg!(r10w, Gpr, 16, r10), reg!(r11w, Gpr, 16, r11),
    reg!(r12w, Gpr, 16, r12), reg!(r13w, Gpr, 16, r13), reg!(r14w, Gpr, 16, r14), reg!(r15w, Gpr, 16, r15),

    reg!(eax, Gpr, 32, rax), reg!(ebx, Gpr, 32, rbx), reg!(ecx, Gpr, 32, rcx), reg!(edx, Gpr, 32, rdx),
    reg!(esi, Gpr, 32, rsi), reg!(edi, Gpr, 32, rdi), reg!(esp, Gpr, 32, rsp), reg!(ebp, Gpr, 32, rbp),
    reg!(r8d, Gpr, 32, r8), reg!(r9d, Gpr, 32, r9), reg!(r10d, Gpr, 32, r10), reg!(r11d, Gpr, 32, r11),
    reg!(r12d, Gpr, 32, r12), reg!(r13d, Gpr, 32, r13), reg!(r14d, Gpr, 32, r14), reg!(r15d, Gpr, 32, r15),

    reg!(rax, Gpr, 64, rax), reg!(rbx, Gpr, 64, rbx), reg!(rcx, Gpr, 64, rcx), reg!(rdx, Gpr, 64, rdx),
    reg!(rsi, Gpr, 64, rsi), reg!(rdi, Gpr, 64, rdi), reg!(rsp, Gpr, 64, rsp), reg!(rbp, Gpr, 64, rbp),
    reg!(r8, Gpr, 64, r8), reg!(r9, Gpr, 64, r9), reg!(r10, Gpr, 64, r10), reg!(r11, Gpr, 64, r11),
    reg!(r12, Gpr, 64, r12), reg!(r13, Gpr, 64, r13), reg!(r14, Gpr, 64, r14), reg!(r15, Gpr, 64, r15),

    reg!(xmm0, Xmm, 128, zmm0), reg!(xmm1, Xmm, 128, zmm1), reg!(xmm2, Xmm, 128, zmm2), reg!(xmm3, Xmm, 128, zmm3),
    reg!(xmm4, Xmm, 128, zmm4), reg!(xmm5, Xmm, 128, zmm5), reg!(xmm6, Xmm, 128, zmm6), reg!(xmm7, Xmm, 128, zmm7),
    reg!(xmm8, Xmm, 128, zmm8), reg!(xmm9, Xmm, 128, zmm9), reg!(xmm10, Xmm, 128, zmm10), reg!(xmm11, Xmm, 128, zmm11),
    reg!(xmm12, Xmm, 128, zmm12), reg!(xmm13, Xmm, 128, zmm13), reg!(xmm14, Xmm, 128, zmm14), reg!(xmm15, Xmm, 128, zmm15),

    reg!(ymm0, Ymm, 256, zmm0), reg!(ymm1, Ymm, 256, zmm1), reg!(ymm2, Ymm, 256, zmm2), reg!(ymm3, Ymm, 256, zmm3),
    reg!(ymm4, Ymm, 256, zmm4), reg!(ymm5, Ymm, 256, zmm5), reg!(ymm6, Ymm, 256, zmm6), reg!(ymm7, Ymm, 256, zmm7),
    reg!(ymm8, Ymm, 256, zmm8), reg!(ymm9, Ymm, 256, zmm9), reg!(ymm10, Ymm, 256, zmm10), reg!(ymm11, Ymm, 256, zmm11),
    reg!(ymm12, Ymm, 256, zmm12), reg!(ymm13, Ymm, 256, zmm13), reg!(ymm14, Ymm, 256, zmm14), reg!(ymm15, Ymm, 256, zmm15),

    reg!(zmm0, Zmm, 512, zmm0), reg!(zmm1, Zmm, 512, zmm1), reg!(zmm2, Zmm, 512, zmm2), reg!(zmm3, Zmm, 512, zmm3),
    reg!(zmm4, Zmm, 512, zmm4), reg!(zmm5, Zmm, 512, zmm5), reg!(zmm6, Zmm, 512, zmm6), reg!(zmm7, Zmm, 512, zmm7),
    reg!(zmm8, Zmm, 512, zmm8), reg!(zmm9, Zmm, 512, zmm9), reg!(zmm10, Zmm, 512, zmm10), reg!(zmm11, Zmm, 512, zmm11),
    reg!(zmm12, Zmm, 512, zmm12), reg!(zmm13, Zmm, 512, zmm13), reg!(zmm14, Zmm, 512, zmm14), reg!(zmm15, Zmm, 512, zmm15),

    reg!(cs, Segment, 16, cs), reg!(ds, Segment, 16, ds), reg!(es, Segment, 16, es),
    reg!(ss, Segment, 16, ss), reg!(fs, Segment, 16, fs), reg!(gs, Segment, 16, gs),

    reg!(eflags, Flags, 64, eflags),
    reg!(rip, Gpr, 64, rip),
];

/// Returns the descriptor for `id` in O(1), since [`REGISTERS`] is ordered
/// to match [`RegisterId`]'s discriminants.
pub fn register_info(id: RegisterId) -> &'static RegisterInfo {
    &REGISTERS[id as usize]
}

/// Given an input *lowercase* register name, return its descriptor or
/// `None` — spec §3 "Lookups by lowercase name return descriptors in O(table
/// size)".
pub fn lookup(name: &str) -> Option<&'static RegisterInfo> {
    let lower = name.to_ascii_lowercase();
    RegisterId::from_str(&lower).ok().map(register_info)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_is_ordered_to_match_discriminants() {
        for (i, info) in REGISTERS.iter().enumerate() {
            assert_eq!(info.id as usize, i, "register {} out of position", info.name);
        }
    }

    #[test]
    fn enclosing_register_of_sub_register_is_widest_alias() {
        assert_eq!(lookup("al").unwrap().enclosing_id, RegisterId::rax);
        assert_eq!(lookup("eax").unwrap().enclosing_id, RegisterId::rax);
        assert_eq!(lookup("ax").unwrap().enclosing_id, RegisterId::rax);
        assert_eq!(lookup("r9b").unwrap().enclosing_id, RegisterId::r9);
    }

    #[test]
    fn vector_register_enclosing_is_zmm_form() {
        assert_eq!(lookup("xmm3").unwrap().enclosing_id, RegisterId::zmm3);
        assert_eq!(lookup("ymm3").unwrap().enclosing_id, RegisterId::zmm3);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("RAX").unwrap().id, RegisterId::rax);
        assert_eq!(lookup("Fs").unwrap().id, RegisterId::fs);
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(lookup("notareg").is_none());
    }

    #[test]
    fn widths_are_architectural() {
        for info in REGISTERS {
            assert!(matches!(info.width_bits, 8 | 16 | 32 | 64 | 128 | 256 | 512));
        }
    }
}
