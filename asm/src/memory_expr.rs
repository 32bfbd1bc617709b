//! Stage 3 memory-operand grammar (spec §4.1):
//! `[ seg ':' ] '[' base ( ('+'|'-') index ('*' scale)? )? ( ('+'|'-') disp )? ']'`
//! A bracket body that is itself a single numeric literal is pure
//! displacement addressing.

use crate::int_literal::parse_int_literal;
use crate::operand::MemoryDescriptor;
use inasm64::error::ParserError;

pub fn parse_memory_expr(raw: &str) -> Result<MemoryDescriptor, ParserError> {
    let (segment, bracketed) = match raw.find(':') {
        Some(idx) if raw[idx + 1..].starts_with('[') => {
            (Some(raw[..idx].to_string()), &raw[idx + 1..])
        }
        _ => (None, raw),
    };

    let inner = bracketed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or(ParserError::InvalidOperandFormat)?
        .trim();
    if inner.is_empty() {
        return Err(ParserError::InvalidOperandFormat);
    }

    if let Ok(disp) = parse_int_literal(inner) {
        return Ok(MemoryDescriptor {
            segment,
            base: None,
            index: None,
            scale: 1,
            disp: disp as i32,
            disp_width_bits: disp_width(disp),
        });
    }

    let terms = split_terms(inner)?;
    let mut desc = MemoryDescriptor {
        segment,
        scale: 1,
        ..Default::default()
    };
    let mut have_disp = false;

    for (index, (negative, term)) in terms.iter().enumerate() {
        if index == 0 {
            if *negative || !starts_with_alpha(term) {
                return Err(ParserError::InvalidOperandFormat);
            }
            desc.base = Some(term.clone());
            continue;
        }
        if let Some(star) = term.find('*') {
            if term.matches('*').count() > 1 || desc.index.is_some() {
                return Err(ParserError::InvalidOperandScale);
            }
            if *negative {
                return Err(ParserError::InvalidOperandFormat);
            }
            let (idx_name, scale_lit) = term.split_at(star);
            let scale_lit = &scale_lit[1..];
            if !starts_with_alpha(idx_name) {
                return Err(ParserError::InvalidOperandFormat);
            }
            let scale_val = parse_int_literal(scale_lit)
                .map_err(|_| ParserError::InvalidOperandScale)?;
            if !matches!(scale_val, 1 | 2 | 4 | 8) {
                return Err(ParserError::InvalidOperandScale);
            }
            desc.index = Some(idx_name.to_string());
            desc.scale = scale_val as u8;
        } else if starts_with_alpha(term) {
            if *negative || desc.index.is_some() {
                return Err(ParserError::InvalidOperandFormat);
            }
            desc.index = Some(term.clone());
        } else {
            if have_disp {
                return Err(ParserError::InvalidOperandFormat);
            }
            let magnitude = parse_int_literal(term)?;
            let disp = if *negative { -magnitude } else { magnitude };
            desc.disp = disp as i32;
            desc.disp_width_bits = disp_width(disp);
            have_disp = true;
        }
    }

    Ok(desc)
}

fn disp_width(disp: i64) -> u16 {
    if (i8::MIN as i64..=i8::MAX as i64).contains(&disp) {
        8
    } else {
        32
    }
}

fn starts_with_alpha(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Splits a bracket body into top-level `(is_negative, term)` pairs on `+`
/// and `-`. The first term never carries a sign.
fn split_terms(inner: &str) -> Result<Vec<(bool, String)>, ParserError> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut negative = false;
    let mut first = true;

    for ch in inner.chars() {
        if ch == '+' || ch == '-' {
            if current.is_empty() {
                return Err(ParserError::InvalidOperandFormat);
            }
            terms.push((negative, std::mem::take(&mut current)));
            negative = ch == '-';
            first = false;
        } else if !ch.is_whitespace() {
            current.push(ch);
        }
    }
    if current.is_empty() {
        return Err(ParserError::InvalidOperandFormat);
    }
    terms.push((negative, current));
    if first {
        terms[0].0 = false;
    }
    if terms.len() > 3 {
        return Err(ParserError::InvalidOperandFormat);
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_displacement() {
        let d = parse_memory_expr("fs:[0x11223344]").unwrap();
        assert!(d.is_pure_displacement());
        assert_eq!(d.segment.as_deref(), Some("fs"));
        assert_eq!(d.disp, 0x11223344u32 as i32);
    }

    #[test]
    fn base_index_scale_and_negative_disp() {
        let d = parse_memory_expr("fs:[eax + esi*2 - 11223344h]").unwrap();
        assert_eq!(d.base.as_deref(), Some("eax"));
        assert_eq!(d.index.as_deref(), Some("esi"));
        assert_eq!(d.scale, 2);
        assert_eq!(d.disp, -0x11223344i64 as i32);
    }

    #[test]
    fn base_plus_displacement_without_index() {
        let d = parse_memory_expr("[rbx+10h]").unwrap();
        assert_eq!(d.base.as_deref(), Some("rbx"));
        assert!(d.index.is_none());
        assert_eq!(d.disp, 0x10);
    }

    #[test]
    fn base_only() {
        let d = parse_memory_expr("[rbx]").unwrap();
        assert_eq!(d.base.as_deref(), Some("rbx"));
        assert_eq!(d.disp, 0);
    }

    #[test]
    fn invalid_scale_is_rejected() {
        let err = parse_memory_expr("[eax+esi*3]").unwrap_err();
        assert_eq!(err, ParserError::InvalidOperandScale);
    }

    #[test]
    fn missing_brackets_is_rejected() {
        assert_eq!(
            parse_memory_expr("eax").unwrap_err(),
            ParserError::InvalidOperandFormat
        );
    }
}
