//! Register-file access (spec §4.3 "Register access"): mapping between the
//! architecture table's [`RegisterId`] and the raw GPR snapshot ptrace
//! hands back, including the sub-register write semantics spec §4.3 calls
//! out explicitly ("writing an 8-bit low register clears bits 8..31 of its
//! enclosing 32-bit alias; writing a 32-bit register zeroes bits 32..63").

use inasm64::arch::{self, RegClass, RegisterId};
use inasm64::error::RuntimeError;

/// A snapshot of the traced process's general-purpose registers, segment
/// selectors, flags and instruction pointer, in the shape ptrace hands
/// back (spec's `libc::user_regs_struct` on Linux).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub gpr: [u64; 16],
    pub rip: u64,
    pub eflags: u64,
    pub cs: u64,
    pub ss: u64,
    pub ds: u64,
    pub es: u64,
    pub fs: u64,
    pub gs: u64,
}

/// Index into [`RegisterSnapshot::gpr`] that each 64-bit GPR occupies,
/// following Intel's ModRM/SIB encoding order rather than [`RegisterId`]'s
/// declaration order — the same mapping the encoder uses, duplicated here
/// because this crate does not depend on `inasm64-asm`.
fn gpr_slot(enclosing: RegisterId) -> Option<usize> {
    use RegisterId::*;
    Some(match enclosing {
        rax => 0,
        rcx => 1,
        rdx => 2,
        rbx => 3,
        rsp => 4,
        rbp => 5,
        rsi => 6,
        rdi => 7,
        r8 => 8,
        r9 => 9,
        r10 => 10,
        r11 => 11,
        r12 => 12,
        r13 => 13,
        r14 => 14,
        r15 => 15,
        _ => return None,
    })
}

#[cfg(target_os = "linux")]
impl RegisterSnapshot {
    pub fn from_ptrace(regs: &nix::libc::user_regs_struct) -> RegisterSnapshot {
        let mut gpr = [0u64; 16];
        gpr[0] = regs.rax;
        gpr[1] = regs.rcx;
        gpr[2] = regs.rdx;
        gpr[3] = regs.rbx;
        gpr[4] = regs.rsp;
        gpr[5] = regs.rbp;
        gpr[6] = regs.rsi;
        gpr[7] = regs.rdi;
        gpr[8] = regs.r8;
        gpr[9] = regs.r9;
        gpr[10] = regs.r10;
        gpr[11] = regs.r11;
        gpr[12] = regs.r12;
        gpr[13] = regs.r13;
        gpr[14] = regs.r14;
        gpr[15] = regs.r15;
        RegisterSnapshot {
            gpr,
            rip: regs.rip,
            eflags: regs.eflags,
            cs: regs.cs,
            ss: regs.ss,
            ds: regs.ds,
            es: regs.es,
            fs: regs.fs,
            gs: regs.gs,
        }
    }

    pub fn apply_to_ptrace(&self, regs: &mut nix::libc::user_regs_struct) {
        regs.rax = self.gpr[0];
        regs.rcx = self.gpr[1];
        regs.rdx = self.gpr[2];
        regs.rbx = self.gpr[3];
        regs.rsp = self.gpr[4];
        regs.rbp = self.gpr[5];
        regs.rsi = self.gpr[6];
        regs.rdi = self.gpr[7];
        regs.r8 = self.gpr[8];
        regs.r9 = self.gpr[9];
        regs.r10 = self.gpr[10];
        regs.r11 = self.gpr[11];
        regs.r12 = self.gpr[12];
        regs.r13 = self.gpr[13];
        regs.r14 = self.gpr[14];
        regs.r15 = self.gpr[15];
        regs.rip = self.rip;
        regs.eflags = self.eflags;
    }
}

/// Reads `id`'s current value out of `snapshot`, masked to `id`'s own width
/// (spec §4.3 "Register access": reading `al` returns only its low byte).
pub fn get_reg(snapshot: &RegisterSnapshot, id: RegisterId) -> Result<u64, RuntimeError> {
    let info = arch::register_info(id);
    if id == RegisterId::rip {
        return Ok(snapshot.rip);
    }
    if id == RegisterId::eflags {
        return Ok(snapshot.eflags);
    }
    if info.class != RegClass::Gpr {
        return Err(RuntimeError::SystemError(format!(
            "register class {:?} is not addressable as a GPR",
            info.class
        )));
    }
    let slot = gpr_slot(info.enclosing_id)
        .ok_or_else(|| RuntimeError::SystemError(format!("no GPR slot for {}", info.name)))?;
    let full = snapshot.gpr[slot];
    Ok(match (info.width_bits, is_high_byte(id)) {
        (8, true) => (full >> 8) & 0xff,
        (8, false) => full & 0xff,
        (16, _) => full & 0xffff,
        (32, _) => full & 0xffff_ffff,
        (64, _) => full,
        _ => unreachable!("GPR widths are 8/16/32/64"),
    })
}

/// Writes `value` into `id` within `snapshot`, applying the sub-register
/// write semantics spec §4.3 requires: an 8-bit low write clears bits
/// 8..31 (not just 8..15) of the enclosing register, and a 32-bit write
/// zeroes bits 32..63 — the two cases where x86-64 does not preserve the
/// untouched high bits of the 64-bit alias.
pub fn set_reg(snapshot: &mut RegisterSnapshot, id: RegisterId, value: u64) -> Result<(), RuntimeError> {
    let info = arch::register_info(id);
    if id == RegisterId::rip {
        snapshot.rip = value;
        return Ok(());
    }
    if id == RegisterId::eflags {
        snapshot.eflags = value;
        return Ok(());
    }
    if info.class != RegClass::Gpr {
        return Err(RuntimeError::SystemError(format!(
            "register class {:?} is not addressable as a GPR",
            info.class
        )));
    }
    let slot = gpr_slot(info.enclosing_id)
        .ok_or_else(|| RuntimeError::SystemError(format!("no GPR slot for {}", info.name)))?;
    let full = &mut snapshot.gpr[slot];
    *full = match (info.width_bits, is_high_byte(id)) {
        (8, true) => (*full & !0xff00) | ((value & 0xff) << 8),
        (8, false) => (*full & !0xffu64) | (value & 0xff),
        (16, _) => (*full & !0xffffu64) | (value & 0xffff),
        (32, _) => value & 0xffff_ffff,
        (64, _) => value,
        _ => unreachable!("GPR widths are 8/16/32/64"),
    };
    Ok(())
}

fn is_high_byte(id: RegisterId) -> bool {
    matches!(
        id,
        RegisterId::ah | RegisterId::bh | RegisterId::ch | RegisterId::dh
    )
}

/// The registers a `Step` diffs to produce a change set (spec §4.3).
pub fn tracked_ids() -> impl Iterator<Item = RegisterId> {
    use RegisterId::*;
    [
        rax, rbx, rcx, rdx, rsi, rdi, rsp, rbp, r8, r9, r10, r11, r12, r13, r14, r15, rip, eflags,
    ]
    .into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_byte_write_preserves_upper_bits_of_word() {
        let mut snap = RegisterSnapshot::default();
        snap.gpr[0] = 0xdead_beef_0000_1234;
        set_reg(&mut snap, RegisterId::al, 0xff).unwrap();
        assert_eq!(snap.gpr[0], 0xdead_beef_0000_12ff);
    }

    #[test]
    fn high_byte_write_targets_bits_8_to_15() {
        let mut snap = RegisterSnapshot::default();
        snap.gpr[0] = 0;
        set_reg(&mut snap, RegisterId::ah, 0xff).unwrap();
        assert_eq!(snap.gpr[0], 0xff00);
    }

    #[test]
    fn dword_write_zero_extends_to_64_bits() {
        let mut snap = RegisterSnapshot::default();
        snap.gpr[0] = 0xffff_ffff_ffff_ffff;
        set_reg(&mut snap, RegisterId::eax, 0x1122_3344).unwrap();
        assert_eq!(snap.gpr[0], 0x1122_3344);
    }

    #[test]
    fn word_write_preserves_upper_32_bits() {
        let mut snap = RegisterSnapshot::default();
        snap.gpr[0] = 0x1122_3344_0000_0000;
        set_reg(&mut snap, RegisterId::ax, 0xbeef).unwrap();
        assert_eq!(snap.gpr[0], 0x1122_3344_0000_beef);
    }

    #[test]
    fn read_masks_to_requested_width() {
        let mut snap = RegisterSnapshot::default();
        snap.gpr[0] = 0x1122_3344_5566_7788;
        assert_eq!(get_reg(&snap, RegisterId::al).unwrap(), 0x88);
        assert_eq!(get_reg(&snap, RegisterId::ah).unwrap(), 0x77);
        assert_eq!(get_reg(&snap, RegisterId::ax).unwrap(), 0x7788);
        assert_eq!(get_reg(&snap, RegisterId::eax).unwrap(), 0x5566_7788);
        assert_eq!(get_reg(&snap, RegisterId::rax).unwrap(), 0x1122_3344_5566_7788);
    }

    #[test]
    fn vector_registers_are_rejected() {
        let snap = RegisterSnapshot::default();
        assert!(get_reg(&snap, RegisterId::xmm0).is_err());
    }
}
