//! Consumes a parsed [`Statement`] and emits 1-15 machine bytes (spec
//! §4.2). Specified by the rules it enforces, not by implementation
//! strategy: mnemonic resolution, operand width install, per-operand
//! emission (register / memory / immediate), AVX vector-length
//! inference, and the final bounded emission into a 15-byte buffer.

use crate::instructions::lookup_alu;
use crate::operand::{MemoryDescriptor, Operand, OperandKind, OperandPayload, Statement};
use inasm64::arch::{self, RegClass, RegisterInfo};
use inasm64::error::EncodeError;
use inasm64::MAX_INSTRUCTION_BYTES;

/// An emitted instruction: the architectural cap is 15 bytes (spec §3
/// "Encoded instruction").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedInstruction {
    bytes: [u8; MAX_INSTRUCTION_BYTES],
    len: u8,
}

impl EncodedInstruction {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Accumulates bytes up to the architectural cap, in prefix → opcode →
/// ModRM/SIB → displacement → immediate order.
struct Buffer {
    bytes: [u8; MAX_INSTRUCTION_BYTES],
    len: usize,
}

impl Buffer {
    fn new() -> Self {
        Buffer { bytes: [0; MAX_INSTRUCTION_BYTES], len: 0 }
    }

    fn push(&mut self, byte: u8) -> Result<(), EncodeError> {
        if self.len == MAX_INSTRUCTION_BYTES {
            return Err(EncodeError::CodeBufferFull);
        }
        self.bytes[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        for &b in bytes {
            self.push(b)?;
        }
        Ok(())
    }

    fn finish(self) -> EncodedInstruction {
        EncodedInstruction { bytes: self.bytes, len: self.len as u8 }
    }
}

/// One resolved register operand: its machine encoding number (0-7) and
/// whether the high REX extension bit is set (register index 8-15).
#[derive(Clone, Copy)]
struct ResolvedReg {
    info: &'static RegisterInfo,
    number: u8,
    extended: bool,
}

fn resolve_register(name: &str) -> Result<ResolvedReg, EncodeError> {
    let info = arch::lookup(name).ok_or(EncodeError::InvalidDestRegisterName)?;
    let (number, extended) = gpr_machine_number(info)?;
    Ok(ResolvedReg { info, number, extended })
}

/// Machine register numbers follow Intel's ModRM/SIB encoding order, which
/// does not match the table's declaration order (spec §3 register
/// descriptor is silent on encoding number; this is purely an x86-64
/// encoding detail local to the encoder).
fn gpr_machine_number(info: &RegisterInfo) -> Result<(u8, bool), EncodeError> {
    use inasm64::RegisterId::*;
    let (low_nibble, extended) = match info.enclosing_id {
        rax => (0, false),
        rcx => (1, false),
        rdx => (2, false),
        rbx => (3, false),
        rsp => (4, false),
        rbp => (5, false),
        rsi => (6, false),
        rdi => (7, false),
        r8 => (0, true),
        r9 => (1, true),
        r10 => (2, true),
        r11 => (3, true),
        r12 => (4, true),
        r13 => (5, true),
        r14 => (6, true),
        r15 => (7, true),
        _ => return Err(EncodeError::UnsupportedInstructionType),
    };
    Ok((low_nibble, extended))
}

fn scale_bits(scale: u8) -> Result<u8, EncodeError> {
    match scale {
        1 => Ok(0b00),
        2 => Ok(0b01),
        4 => Ok(0b10),
        8 => Ok(0b11),
        _ => Err(EncodeError::EncodeError),
    }
}

fn modrm(mode: u8, reg: u8, rm: u8) -> u8 {
    (mode << 6) | ((reg & 0b111) << 3) | (rm & 0b111)
}

fn sib(scale: u8, index: u8, base: u8) -> u8 {
    (scale << 6) | ((index & 0b111) << 3) | (base & 0b111)
}

fn segment_prefix_byte(name: &str) -> Result<u8, EncodeError> {
    match name {
        "es" => Ok(0x26),
        "cs" => Ok(0x2e),
        "ss" => Ok(0x36),
        "ds" => Ok(0x3e),
        "fs" => Ok(0x64),
        "gs" => Ok(0x65),
        _ => Err(EncodeError::InvalidDestRegisterName),
    }
}

/// Resolves a memory descriptor's segment/base/index registers and builds
/// its addressing bytes (spec §4.2 rule 3). Returns `(legacy_prefixes,
/// modrm_sib_disp, rex_bits)`: the legacy prefixes (segment override,
/// address-size override) must precede the opcode, while the ModRM/SIB/
/// displacement bytes follow it.
fn encode_memory(mem: &MemoryDescriptor, modrm_reg: u8) -> Result<(Vec<u8>, Vec<u8>, u8), EncodeError> {
    let segment_prefix = mem.segment.as_deref().map(segment_prefix_byte).transpose()?;

    let base = mem.base.as_deref().map(resolve_register).transpose()?;
    let index = mem.index.as_deref().map(resolve_register).transpose()?;

    let effective_address_size = effective_address_size(base.as_ref(), index.as_ref())?;
    let address_size_prefix = effective_address_size == 32;

    let mut prefixes = Vec::new();
    if let Some(seg) = segment_prefix {
        prefixes.push(seg);
    }
    if address_size_prefix {
        prefixes.push(0x67);
    }

    let (rex_x, rex_b, modrm_byte, sib_byte, disp) = match (base, index) {
        (None, None) => {
            // Pure displacement: absolute disp32 requires the SIB escape
            // (ModRM.rm=100, SIB.base=101) since Mod=00/RM=101 alone means
            // RIP-relative in 64-bit mode.
            let m = modrm(0b00, modrm_reg, 0b100);
            let s = sib(0b00, 0b100, 0b101);
            (false, false, m, Some(s), mem.disp.to_le_bytes().to_vec())
        }
        (Some(base), None) => {
            let needs_disp8_forced = base.number == 0b101 && mem.disp == 0; // rbp/r13 need an explicit disp
            let mode = if needs_disp8_forced {
                0b01
            } else if mem.disp == 0 {
                0b00
            } else if mem.disp_width_bits == 8 {
                0b01
            } else {
                0b10
            };
            if base.number == 0b100 {
                // rsp/r12 require a SIB byte even with no index.
                let m = modrm(mode, modrm_reg, 0b100);
                let s = sib(0b00, 0b100, base.number);
                let disp = disp_bytes(mem.disp, mode);
                (false, base.extended, m, Some(s), disp)
            } else {
                let m = modrm(mode, modrm_reg, base.number);
                let disp = disp_bytes(mem.disp, mode);
                (false, base.extended, m, None, disp)
            }
        }
        (base, Some(index)) => {
            let scale = scale_bits(mem.scale)?;
            let base_number = base.as_ref().map(|b| b.number).unwrap_or(0b101);
            let mode = match (&base, mem.disp) {
                (None, _) => 0b00,
                (Some(_), 0) => 0b00,
                (Some(_), _) if mem.disp_width_bits == 8 => 0b01,
                (Some(_), _) => 0b10,
            };
            let m = modrm(mode, modrm_reg, 0b100);
            let s = sib(scale, index.number, base_number);
            let disp = if base.is_none() {
                mem.disp.to_le_bytes().to_vec()
            } else {
                disp_bytes(mem.disp, mode)
            };
            (index.extended, base.map(|b| b.extended).unwrap_or(false), m, Some(s), disp)
        }
    };

    let mut body = Vec::new();
    body.push(modrm_byte);
    if let Some(s) = sib_byte {
        body.push(s);
    }
    body.extend_from_slice(&disp);

    let mut rex_bits = 0u8;
    if rex_x {
        rex_bits |= 0b0010;
    }
    if rex_b {
        rex_bits |= 0b0001;
    }
    Ok((prefixes, body, rex_bits))
}

fn disp_bytes(disp: i32, mode: u8) -> Vec<u8> {
    match mode {
        0b01 => vec![disp as i8 as u8],
        0b10 => disp.to_le_bytes().to_vec(),
        _ => Vec::new(),
    }
}

fn effective_address_size(
    base: Option<&ResolvedReg>,
    index: Option<&ResolvedReg>,
) -> Result<u16, EncodeError> {
    let widths = [base, index].into_iter().flatten().map(|r| r.info.width_bits);
    if widths.clone().any(|w| w == 32) {
        Ok(32)
    } else if widths.clone().any(|w| w == 16) {
        // 16-bit addressing does not exist in long mode.
        Err(EncodeError::UnsupportedInstructionType)
    } else {
        Ok(64)
    }
}

/// Bit used for the ModRM/SIB `reg`/`base`/`index` field when the operand
/// is a register, distinct from [`gpr_machine_number`]'s resolution of the
/// rm-side register.
fn legacy_prefix_bytes(stmt: &Statement) -> Vec<u8> {
    let mut bytes = Vec::new();
    if stmt.prefixes.lock {
        bytes.push(0xf0);
    }
    if stmt.prefixes.rep || stmt.prefixes.repe {
        bytes.push(0xf3);
    } else if stmt.prefixes.repne {
        bytes.push(0xf2);
    }
    bytes
}

fn rex_byte(w: bool, r: bool, x: bool, b: bool) -> Option<u8> {
    if !(w || r || x || b) {
        None
    } else {
        Some(0x40 | ((w as u8) << 3) | ((r as u8) << 2) | ((x as u8) << 1) | (b as u8))
    }
}

/// spec §4.2 rule 3, immediate width clamp: narrower than the destination
/// is fine if it can be sign-extended; wider is rejected.
fn immediate_bytes(value: i64, dest_width: u16) -> Result<Vec<u8>, EncodeError> {
    match dest_width {
        8 => {
            if !(i8::MIN as i64..=u8::MAX as i64).contains(&value) {
                return Err(EncodeError::InvalidImmediateOperandBitWidth);
            }
            Ok(vec![value as u8])
        }
        16 => {
            if !(i16::MIN as i64..=u16::MAX as i64).contains(&value) {
                return Err(EncodeError::InvalidImmediateOperandBitWidth);
            }
            Ok((value as u16).to_le_bytes().to_vec())
        }
        32 | 64 => {
            if !(i32::MIN as i64..=u32::MAX as i64).contains(&value) {
                return Err(EncodeError::InvalidImmediateOperandBitWidth);
            }
            Ok((value as u32).to_le_bytes().to_vec())
        }
        _ => Err(EncodeError::EncodeError),
    }
}

/// Entry point (spec §4.2 contract).
pub fn encode(stmt: &Statement) -> Result<EncodedInstruction, EncodeError> {
    check_operand_size_mismatch(stmt)?;

    let mut buf = Buffer::new();
    buf.extend(&legacy_prefix_bytes(stmt))?;

    match stmt.mnemonic.as_str() {
        "nop" => buf.push(0x90)?,
        "ret" => buf.push(0xc3)?,
        "int3" => buf.push(0xcc)?,
        "mov" => encode_mov(stmt, &mut buf)?,
        "lea" => encode_lea(stmt, &mut buf)?,
        "inc" | "dec" => encode_inc_dec(stmt, &mut buf)?,
        "jmp" => encode_jmp(stmt, &mut buf)?,
        "push" => encode_push_pop(stmt, &mut buf, 0x50)?,
        "pop" => encode_push_pop(stmt, &mut buf, 0x58)?,
        mnemonic => {
            if let Some(alu) = lookup_alu(mnemonic) {
                encode_alu(stmt, *alu, &mut buf)?;
            } else {
                return Err(EncodeError::InvalidInstructionName);
            }
        }
    }

    Ok(buf.finish())
}

fn check_operand_size_mismatch(stmt: &Statement) -> Result<(), EncodeError> {
    if let (Some(a), Some(b)) = (stmt.operands.first(), stmt.operands.get(1)) {
        if a.explicit_width && b.explicit_width && a.width_bits != b.width_bits {
            return Err(EncodeError::OperandSizesMismatch);
        }
    }
    Ok(())
}

fn size_prefix(width: u16, buf: &mut Buffer) -> Result<bool, EncodeError> {
    if width == 16 {
        buf.push(0x66)?;
    }
    Ok(width == 64)
}

fn encode_alu(
    stmt: &Statement,
    op: crate::instructions::AluOp,
    buf: &mut Buffer,
) -> Result<(), EncodeError> {
    let dst = stmt.operand(0).ok_or(EncodeError::EncodeError)?;
    let src = stmt.operand(1).ok_or(EncodeError::EncodeError)?;
    let width = dst.width_bits;
    let rex_w = size_prefix(width, buf)?;

    match (&dst.kind, &src.kind) {
        (OperandKind::Register, OperandKind::Register) => {
            let dst_reg = register_payload(dst)?;
            let src_reg = register_payload(src)?;
            let dst_r = resolve_register(dst_reg)?;
            let src_r = resolve_register(src_reg)?;
            let opcode = op.base_opcode + if width == 8 { 2 } else { 3 };
            emit_rex(buf, rex_w, dst_r.extended, false, src_r.extended)?;
            buf.push(opcode)?;
            buf.push(modrm(0b11, dst_r.number, src_r.number))?;
        }
        (OperandKind::Register, OperandKind::Memory) => {
            let dst_reg = resolve_register(register_payload(dst)?)?;
            let mem = memory_payload(src)?;
            let opcode = op.base_opcode + if width == 8 { 2 } else { 3 };
            let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, dst_reg.number)?;
            buf.extend(&mem_prefix)?;
            emit_rex(buf, rex_w, dst_reg.extended, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
            buf.push(opcode)?;
            buf.extend(&mem_bytes)?;
        }
        (OperandKind::Memory, OperandKind::Register) => {
            let mem = memory_payload(dst)?;
            let src_reg = resolve_register(register_payload(src)?)?;
            let opcode = op.base_opcode + if width == 8 { 0 } else { 1 };
            let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, src_reg.number)?;
            buf.extend(&mem_prefix)?;
            emit_rex(buf, rex_w, src_reg.extended, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
            buf.push(opcode)?;
            buf.extend(&mem_bytes)?;
        }
        (OperandKind::Register, OperandKind::Immediate) => {
            let dst_reg = resolve_register(register_payload(dst)?)?;
            let value = immediate_payload(src)?;
            emit_rex(buf, rex_w, false, false, dst_reg.extended)?;
            encode_group1_imm(buf, op.digit, width, value, 0b11, dst_reg.number, None)?;
        }
        (OperandKind::Memory, OperandKind::Immediate) => {
            let mem = memory_payload(dst)?;
            let value = immediate_payload(src)?;
            let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, op.digit)?;
            buf.extend(&mem_prefix)?;
            emit_rex(buf, rex_w, false, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
            encode_group1_imm(buf, op.digit, width, value, 0, 0, Some(&mem_bytes))?;
        }
        _ => return Err(EncodeError::UnsupportedInstructionType),
    }
    Ok(())
}

/// Emits a group-1 ALU-immediate instruction. When `mem_bytes` is `Some`,
/// the ModRM/SIB/displacement is that of the memory destination, written
/// verbatim (it already carries `op.digit` in its `reg` field); otherwise a
/// register ModRM is built from `mode`/`rm`.
fn encode_group1_imm(
    buf: &mut Buffer,
    digit: u8,
    width: u16,
    value: i64,
    mode: u8,
    rm: u8,
    mem_bytes: Option<&[u8]>,
) -> Result<(), EncodeError> {
    let imm8_fits = width > 8 && (i8::MIN as i64..=i8::MAX as i64).contains(&value);
    let opcode = if width == 8 {
        0x80
    } else if imm8_fits {
        0x83
    } else {
        0x81
    };
    buf.push(opcode)?;
    match mem_bytes {
        Some(bytes) => buf.extend(bytes)?,
        None => buf.push(modrm(mode, digit, rm))?,
    }
    let imm_width = if opcode == 0x83 { 8 } else { width.min(32) };
    buf.extend(&immediate_bytes(value, imm_width)?)?;
    Ok(())
}

fn encode_mov(stmt: &Statement, buf: &mut Buffer) -> Result<(), EncodeError> {
    let dst = stmt.operand(0).ok_or(EncodeError::EncodeError)?;
    let src = stmt.operand(1).ok_or(EncodeError::EncodeError)?;
    let width = dst.width_bits;
    let rex_w = size_prefix(width, buf)?;

    match (&dst.kind, &src.kind) {
        (OperandKind::Register, OperandKind::Register) => {
            let dst_r = resolve_register(register_payload(dst)?)?;
            let src_r = resolve_register(register_payload(src)?)?;
            let opcode = if width == 8 { 0x8a } else { 0x8b };
            emit_rex(buf, rex_w, dst_r.extended, false, src_r.extended)?;
            buf.push(opcode)?;
            buf.push(modrm(0b11, dst_r.number, src_r.number))?;
        }
        (OperandKind::Register, OperandKind::Memory) => {
            let dst_r = resolve_register(register_payload(dst)?)?;
            let mem = memory_payload(src)?;
            let opcode = if width == 8 { 0x8a } else { 0x8b };
            let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, dst_r.number)?;
            buf.extend(&mem_prefix)?;
            emit_rex(buf, rex_w, dst_r.extended, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
            buf.push(opcode)?;
            buf.extend(&mem_bytes)?;
        }
        (OperandKind::Memory, OperandKind::Register) => {
            let mem = memory_payload(dst)?;
            let src_r = resolve_register(register_payload(src)?)?;
            let opcode = if width == 8 { 0x88 } else { 0x89 };
            let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, src_r.number)?;
            buf.extend(&mem_prefix)?;
            emit_rex(buf, rex_w, src_r.extended, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
            buf.push(opcode)?;
            buf.extend(&mem_bytes)?;
        }
        (OperandKind::Register, OperandKind::Immediate) => {
            let dst_r = resolve_register(register_payload(dst)?)?;
            let value = immediate_payload(src)?;
            if width == 64 && !(i32::MIN as i64..=i32::MAX as i64).contains(&value) {
                emit_rex(buf, true, false, false, dst_r.extended)?;
                buf.push(0xb8 + dst_r.number)?;
                buf.extend(&value.to_le_bytes())?;
            } else if width == 8 {
                emit_rex(buf, false, false, false, dst_r.extended)?;
                buf.push(0xb0 + dst_r.number)?;
                buf.extend(&immediate_bytes(value, 8)?)?;
            } else {
                emit_rex(buf, rex_w, false, false, dst_r.extended)?;
                buf.push(0xc7)?;
                buf.push(modrm(0b11, 0, dst_r.number))?;
                buf.extend(&immediate_bytes(value, width.min(32))?)?;
            }
        }
        (OperandKind::Memory, OperandKind::Immediate) => {
            let mem = memory_payload(dst)?;
            let value = immediate_payload(src)?;
            let opcode = if width == 8 { 0xc6 } else { 0xc7 };
            let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, 0)?;
            buf.extend(&mem_prefix)?;
            emit_rex(buf, rex_w, false, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
            buf.push(opcode)?;
            buf.extend(&mem_bytes)?;
            buf.extend(&immediate_bytes(value, width.min(32))?)?;
        }
        _ => return Err(EncodeError::UnsupportedInstructionType),
    }
    Ok(())
}

fn encode_lea(stmt: &Statement, buf: &mut Buffer) -> Result<(), EncodeError> {
    let dst = stmt.operand(0).ok_or(EncodeError::EncodeError)?;
    let src = stmt.operand(1).ok_or(EncodeError::EncodeError)?;
    if dst.kind != OperandKind::Register || src.kind != OperandKind::Memory {
        return Err(EncodeError::UnsupportedInstructionType);
    }
    let dst_r = resolve_register(register_payload(dst)?)?;
    let mem = memory_payload(src)?;
    let rex_w = size_prefix(dst.width_bits, buf)?;
    let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, dst_r.number)?;
    buf.extend(&mem_prefix)?;
    emit_rex(buf, rex_w, dst_r.extended, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
    buf.push(0x8d)?;
    buf.extend(&mem_bytes)?;
    Ok(())
}

fn encode_inc_dec(stmt: &Statement, buf: &mut Buffer) -> Result<(), EncodeError> {
    let operand = stmt.operand(0).ok_or(EncodeError::EncodeError)?;
    let digit = if stmt.mnemonic == "inc" { 0 } else { 1 };
    let rex_w = size_prefix(operand.width_bits, buf)?;
    match &operand.kind {
        OperandKind::Register => {
            let reg = resolve_register(register_payload(operand)?)?;
            let opcode = if operand.width_bits == 8 { 0xfe } else { 0xff };
            emit_rex(buf, rex_w, false, false, reg.extended)?;
            buf.push(opcode)?;
            buf.push(modrm(0b11, digit, reg.number))?;
        }
        OperandKind::Memory => {
            let mem = memory_payload(operand)?;
            let opcode = if operand.width_bits == 8 { 0xfe } else { 0xff };
            let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, digit)?;
            buf.extend(&mem_prefix)?;
            emit_rex(buf, rex_w, false, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
            buf.push(opcode)?;
            buf.extend(&mem_bytes)?;
        }
        OperandKind::Immediate => return Err(EncodeError::UnsupportedInstructionType),
    }
    Ok(())
}

/// Memory-indirect only: multi-line forward labels (and therefore `jmp
/// rel32`) are an explicit non-goal.
fn encode_jmp(stmt: &Statement, buf: &mut Buffer) -> Result<(), EncodeError> {
    let operand = stmt.operand(0).ok_or(EncodeError::EncodeError)?;
    match &operand.kind {
        OperandKind::Memory => {
            let mem = memory_payload(operand)?;
            let (mem_prefix, mem_bytes, mem_rex) = encode_memory(mem, 4)?;
            buf.extend(&mem_prefix)?;
            emit_rex(buf, false, false, mem_rex & 0b10 != 0, mem_rex & 0b01 != 0)?;
            buf.push(0xff)?;
            buf.extend(&mem_bytes)?;
        }
        OperandKind::Register => {
            let reg = resolve_register(register_payload(operand)?)?;
            emit_rex(buf, false, false, false, reg.extended)?;
            buf.push(0xff)?;
            buf.push(modrm(0b11, 4, reg.number))?;
        }
        OperandKind::Immediate => return Err(EncodeError::UnsupportedInstructionType),
    }
    Ok(())
}

fn encode_push_pop(stmt: &Statement, buf: &mut Buffer, base_opcode: u8) -> Result<(), EncodeError> {
    let operand = stmt.operand(0).ok_or(EncodeError::EncodeError)?;
    let reg = resolve_register(register_payload(operand)?)?;
    emit_rex(buf, false, false, false, reg.extended)?;
    buf.push(base_opcode + reg.number)?;
    Ok(())
}

fn emit_rex(buf: &mut Buffer, w: bool, r: bool, x: bool, b: bool) -> Result<(), EncodeError> {
    if let Some(rex) = rex_byte(w, r, x, b) {
        buf.push(rex)?;
    }
    Ok(())
}

fn register_payload(operand: &Operand) -> Result<&str, EncodeError> {
    match &operand.payload {
        OperandPayload::Register(name) => Ok(name),
        _ => Err(EncodeError::UnsupportedInstructionType),
    }
}

fn memory_payload(operand: &Operand) -> Result<&MemoryDescriptor, EncodeError> {
    match &operand.payload {
        OperandPayload::Memory(mem) => Ok(mem),
        _ => Err(EncodeError::UnsupportedInstructionType),
    }
}

fn immediate_payload(operand: &Operand) -> Result<i64, EncodeError> {
    match &operand.payload {
        OperandPayload::Immediate(value) => Ok(*value),
        _ => Err(EncodeError::UnsupportedInstructionType),
    }
}

/// Spec §4.2 rule 4: an XMM/YMM/ZMM operand sets the vector-length field
/// that a real AVX encoder would fold into the VEX/EVEX prefix. The scalar
/// GPR encoder above never reaches this; it exists for callers (e.g. the
/// CLI's instruction classifier) that need the width without re-deriving
/// it from the register class.
pub fn vector_length_bits(stmt: &Statement) -> Option<u16> {
    stmt.operands.iter().find_map(|op| match &op.payload {
        OperandPayload::Register(name) => arch::lookup(name).and_then(|info| match info.class {
            RegClass::Xmm => Some(128),
            RegClass::Ymm => Some(256),
            RegClass::Zmm => Some(512),
            _ => None,
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn encode_line(line: &str) -> EncodedInstruction {
        encode(&parse(line).unwrap()).unwrap()
    }

    #[test]
    fn scenario_1_add_rax_imm32() {
        let enc = encode_line("add rax, 0x44332211");
        assert_eq!(enc.len(), 7);
        assert_eq!(enc.as_slice()[0], 0x48); // REX.W
        assert_eq!(enc.as_slice()[1], 0x81); // group1, imm32
    }

    #[test]
    fn scenario_3_jmp_pure_displacement_memory() {
        let enc = encode_line("jmp dword fs:[0x11223344]");
        // seg(0x64) + opcode + modrm + sib + disp32
        assert_eq!(enc.as_slice()[0], 0x64);
        assert_eq!(enc.len(), 1 + 1 + 1 + 1 + 4);
    }

    #[test]
    fn scenario_4_mov_ax_word_ebx_uses_address_size_override() {
        let enc = encode_line("mov ax, word [ebx]");
        assert!(enc.as_slice().contains(&0x66)); // operand-size
        assert!(enc.as_slice().contains(&0x67)); // address-size
        assert!(enc.as_slice().contains(&0x8b));
    }

    #[test]
    fn scenario_5_mov_rax_imm_fits_sign_extended_form() {
        let enc = encode_line("mov rax, 0x1122");
        assert_eq!(enc.as_slice()[0], 0x48);
        assert_eq!(enc.as_slice()[1], 0xc7);
        assert_eq!(enc.len(), 7);
    }

    #[test]
    fn scenario_6_inc_rax() {
        let enc = encode_line("inc rax");
        assert_eq!(enc.as_slice(), &[0x48, 0xff, 0xc0]);
    }

    #[test]
    fn reg_to_reg_add_needs_no_rex_when_both_low() {
        let enc = encode_line("add eax, ebx");
        assert_eq!(enc.as_slice(), &[0x03, 0xc3]);
    }

    #[test]
    fn extended_register_sets_rex_b() {
        let enc = encode_line("add eax, r9d");
        assert_eq!(enc.as_slice()[0], 0x41);
    }

    #[test]
    fn asymmetric_explicit_sizes_are_rejected() {
        let stmt = parse("mov byte [rbx], word 5").unwrap();
        assert_eq!(encode(&stmt), Err(EncodeError::OperandSizesMismatch));
    }

    #[test]
    fn unknown_mnemonic_is_rejected() {
        let stmt = parse("frobnicate eax, ebx").unwrap();
        assert_eq!(encode(&stmt), Err(EncodeError::InvalidInstructionName));
    }

    #[test]
    fn unknown_register_name_is_rejected() {
        let mut stmt = parse("add eax, ebx").unwrap();
        stmt.operands[1].payload = OperandPayload::Register("notareg".to_string());
        assert_eq!(encode(&stmt), Err(EncodeError::InvalidDestRegisterName));
    }

    #[test]
    fn push_pop_roundtrip_shape() {
        assert_eq!(encode_line("push rax").as_slice(), &[0x50]);
        assert_eq!(encode_line("pop r15").as_slice(), &[0x41, 0x5f]);
    }

    #[test]
    fn vector_length_is_inferred_from_register_class() {
        let stmt = parse("mov xmm0, xmm1").unwrap();
        assert_eq!(vector_length_bits(&stmt), Some(128));
    }
}
