//! Numeric literal parsing (spec §4.1, §6 "Hex literals"): decimal by
//! default, `0x`/`0b` prefixes, or a trailing `h` suffix for hex.

use inasm64::error::ParserError;

pub fn parse_int_literal(raw: &str) -> Result<i64, ParserError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParserError::InvalidOperandFormat);
    }
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let magnitude = parse_unsigned_magnitude(rest)?;
    Ok(if negative {
        -(magnitude as i64)
    } else {
        magnitude as i64
    })
}

fn parse_unsigned_magnitude(rest: &str) -> Result<u64, ParserError> {
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|_| ParserError::InvalidOperandFormat)
    } else if let Some(bin) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2).map_err(|_| ParserError::InvalidOperandFormat)
    } else if let Some(hex) = rest.strip_suffix('h').or_else(|| rest.strip_suffix('H')) {
        u64::from_str_radix(hex, 16).map_err(|_| ParserError::InvalidOperandFormat)
    } else {
        rest.parse::<u64>().map_err(|_| ParserError::InvalidOperandFormat)
    }
}

/// Smallest multiple-of-8 width whose signed range contains `value` (spec
/// §4.1 stage 4: "0x80 → 8, 0x100 → 16 ...").
pub fn immediate_width_bits(value: i64) -> u16 {
    if value >= 0 {
        let bits = 64 - (value as u64).leading_zeros();
        match bits {
            0..=8 => 8,
            9..=16 => 16,
            17..=32 => 32,
            _ => 64,
        }
    } else {
        for width in [8u16, 16, 32] {
            if value >= -(1i64 << (width - 1)) {
                return width;
            }
        }
        64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Spec §8: the computed width is always one of the four
        /// architectural immediate sizes, and it's the *smallest* of them
        /// that still represents the value.
        #[test]
        fn width_is_architectural_and_minimal(value: i64) {
            let width = immediate_width_bits(value);
            prop_assert!(matches!(width, 8 | 16 | 32 | 64));

            let fits = |w: u16| -> bool {
                if w == 64 {
                    return true;
                }
                if value >= 0 {
                    value < (1i64 << w)
                } else {
                    value >= -(1i64 << (w - 1))
                }
            };
            prop_assert!(fits(width));
            if width > 8 {
                prop_assert!(!fits(width / 2));
            }
        }
    }

    #[test]
    fn decimal_hex_and_binary_agree() {
        assert_eq!(parse_int_literal("128").unwrap(), 128);
        assert_eq!(parse_int_literal("0x80").unwrap(), 128);
        assert_eq!(parse_int_literal("80h").unwrap(), 128);
        assert_eq!(parse_int_literal("0b10000000").unwrap(), 128);
    }

    #[test]
    fn signed_literals_are_negated() {
        assert_eq!(parse_int_literal("-10h").unwrap(), -16);
        assert_eq!(parse_int_literal("+10h").unwrap(), 16);
    }

    #[test]
    fn width_rule_matches_spec_examples() {
        assert_eq!(immediate_width_bits(0x80), 8);
        assert_eq!(immediate_width_bits(0x100), 16);
        assert_eq!(immediate_width_bits(0x10000), 32);
        assert_eq!(immediate_width_bits(0x1_0000_0000), 64);
        assert_eq!(immediate_width_bits(0), 8);
    }

    #[test]
    fn negative_widths_use_signed_range() {
        assert_eq!(immediate_width_bits(-1), 8);
        assert_eq!(immediate_width_bits(-129), 16);
        assert_eq!(immediate_width_bits(-40000), 32);
    }

    #[test]
    fn malformed_literal_is_rejected() {
        assert_eq!(
            parse_int_literal("notanumber"),
            Err(ParserError::InvalidOperandFormat)
        );
    }
}
