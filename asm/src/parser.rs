//! Stages 2-4 (spec §4.1): prefix/mnemonic/size recognition, operand
//! decomposition, and operand-width reconciliation.

use crate::int_literal::{immediate_width_bits, parse_int_literal};
use crate::memory_expr::parse_memory_expr;
use crate::operand::{Operand, OperandKind, OperandPayload, PrefixFlags, Statement};
use crate::tokeniser::tokenise;
use inasm64::arch;
use inasm64::error::ParserError;

type PrefixSetter = fn(&mut PrefixFlags);

const PREFIXES: &[(&str, PrefixSetter)] = &[
    ("lock", |p| p.lock = true),
    ("rep", |p| p.rep = true),
    ("repe", |p| p.repe = true),
    ("repne", |p| p.repne = true),
];

fn size_keyword(token: &str) -> Option<u16> {
    match token {
        "byte" => Some(8),
        "word" => Some(16),
        "dword" => Some(32),
        "qword" => Some(64),
        _ => None,
    }
}

/// Entry point: parses one line of input into a [`Statement`] (spec §4.1).
pub fn parse(line: &str) -> Result<Statement, ParserError> {
    let parts = tokenise(line)?;
    let mut part0 = parts[0].clone();

    let mut prefixes = PrefixFlags::default();
    if let Some(first) = part0.first() {
        if let Some((_, set)) = PREFIXES.iter().find(|(name, _)| name == first) {
            set(&mut prefixes);
            part0.remove(0);
        }
    }

    if part0.is_empty() {
        return Err(ParserError::InvalidInstructionFormat);
    }
    let mnemonic = part0.remove(0);

    let mut operand_token_groups: Vec<Vec<String>> = Vec::with_capacity(3);
    operand_token_groups.push(part0);
    operand_token_groups.extend(parts.into_iter().skip(1));

    let mut operands = Vec::with_capacity(operand_token_groups.len());
    let mut declared: Vec<Option<u16>> = Vec::with_capacity(operand_token_groups.len());
    for group in operand_token_groups {
        if group.is_empty() {
            continue;
        }
        let (width, operand) = decompose_operand(&group)?;
        declared.push(width);
        operands.push(operand);
    }

    reconcile_widths(&mut operands, &declared);

    Ok(Statement {
        prefixes,
        mnemonic,
        operands,
    })
}

/// Strips an optional leading size keyword, then classifies the remaining
/// single token as register, immediate, or memory (spec §4.1 stage 3).
fn decompose_operand(tokens: &[String]) -> Result<(Option<u16>, Operand), ParserError> {
    let (declared_width, rest) = match tokens.first().and_then(|t| size_keyword(t)) {
        Some(width) if tokens.len() > 1 => (Some(width), &tokens[1..]),
        _ => (None, tokens),
    };
    if rest.len() != 1 {
        return Err(ParserError::InvalidOperandFormat);
    }
    let raw = &rest[0];

    if raw.contains('[') {
        let descriptor = parse_memory_expr(raw)?;
        let width = declared_width.unwrap_or(32);
        return Ok((
            declared_width,
            Operand {
                kind: OperandKind::Memory,
                width_bits: width,
                payload: OperandPayload::Memory(descriptor),
                explicit_width: declared_width.is_some(),
            },
        ));
    }

    if raw.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        let width = arch::lookup(raw).map(|info| info.width_bits).unwrap_or(0);
        return Ok((
            declared_width,
            Operand {
                kind: OperandKind::Register,
                width_bits: width,
                payload: OperandPayload::Register(raw.clone()),
                explicit_width: false,
            },
        ));
    }

    let value = parse_int_literal(raw)?;
    let width = declared_width.unwrap_or_else(|| immediate_width_bits(value));
    Ok((
        declared_width,
        Operand {
            kind: OperandKind::Immediate,
            width_bits: width,
            payload: OperandPayload::Immediate(value),
            explicit_width: declared_width.is_some(),
        },
    ))
}

/// Spec §4.1 stage 4: memory operands without an explicit size default to a
/// 32-bit seed, overridden to operand 0's width when operand 0 is wider
/// (`mov rax, [rbx]` becomes a 64-bit load without `qword`).
fn reconcile_widths(operands: &mut [Operand], declared: &[Option<u16>]) {
    let Some(op0_width) = operands.first().map(|o| o.width_bits) else {
        return;
    };
    for (operand, declared_width) in operands.iter_mut().zip(declared.iter()).skip(1) {
        if operand.kind == OperandKind::Memory && declared_width.is_none() {
            operand.width_bits = op0_width.max(32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_register_to_register() {
        let s = parse("add eax, ebx").unwrap();
        assert_eq!(s.mnemonic, "add");
        assert_eq!(s.operands.len(), 2);
        assert_eq!(s.operands[0].width_bits, 32);
        assert_eq!(s.operands[1].width_bits, 32);
    }

    #[test]
    fn lock_prefix_is_recognised() {
        let s = parse("lock add eax, ebx").unwrap();
        assert!(s.prefixes.lock);
        assert_eq!(s.mnemonic, "add");
    }

    #[test]
    fn explicit_memory_size_on_second_operand() {
        let s = parse("add eax, dword fs:[eax + esi*2 - 11223344h]").unwrap();
        assert_eq!(s.operands[1].width_bits, 32);
        assert!(s.operands[1].explicit_width);
    }

    #[test]
    fn unmarked_memory_inherits_operand0_width() {
        let s = parse("mov rax, [rbx]").unwrap();
        assert_eq!(s.operands[1].width_bits, 64);
        assert!(!s.operands[1].explicit_width);
    }

    #[test]
    fn explicit_word_overrides_default_seed() {
        let s = parse("mov ax, word [ebx]").unwrap();
        assert_eq!(s.operands[1].width_bits, 16);
    }

    #[test]
    fn memory_destination_with_size_and_immediate_source() {
        let s = parse("mov byte [rbx], 5").unwrap();
        assert_eq!(s.operands[0].width_bits, 8);
        assert_eq!(s.operands[1].width_bits, 8);
    }

    #[test]
    fn zero_operand_instruction() {
        let s = parse("nop").unwrap();
        assert_eq!(s.mnemonic, "nop");
        assert!(s.operands.is_empty());
    }

    #[test]
    fn immediate_width_follows_magnitude_rule() {
        let s = parse("mov eax, 0x100").unwrap();
        assert_eq!(s.operands[1].width_bits, 16);
    }
}
