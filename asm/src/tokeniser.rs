//! Stage 1 (spec §4.1): split a line into up to three comma-delimited
//! parts, each a list of whitespace-separated tokens, with bracketed
//! substrings treated as atomic — a `[` freezes both comma- and
//! whitespace-splitting until the matching `]`.

use inasm64::error::ParserError;

pub fn tokenise(line: &str) -> Result<Vec<Vec<String>>, ParserError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParserError::EmptyInput);
    }

    let mut parts: Vec<Vec<String>> = vec![Vec::new()];
    let mut current = String::new();
    let mut bracket_depth = 0u32;

    let flush_token = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.is_empty() {
            tokens.push(std::mem::take(current));
        }
    };

    for ch in line.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                bracket_depth = bracket_depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                flush_token(&mut current, parts.last_mut().unwrap());
                parts.push(Vec::new());
                if parts.len() > 3 {
                    return Err(ParserError::UnsupportedInstructionFormat);
                }
            }
            c if c.is_whitespace() && bracket_depth == 0 => {
                flush_token(&mut current, parts.last_mut().unwrap());
            }
            c => current.push(c),
        }
    }
    flush_token(&mut current, parts.last_mut().unwrap());

    if parts.iter().all(|p| p.is_empty()) {
        return Err(ParserError::EmptyInput);
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_whitespace_and_commas() {
        let parts = tokenise("add eax, ebx").unwrap();
        assert_eq!(parts, vec![vec!["add", "eax"], vec!["ebx"]]);
    }

    #[test]
    fn brackets_absorb_internal_whitespace_and_commas() {
        let parts = tokenise("add eax, dword fs:[eax + esi*2 - 11223344h]").unwrap();
        assert_eq!(
            parts,
            vec![
                vec!["add", "eax"],
                vec!["dword", "fs:[eax + esi*2 - 11223344h]"],
            ]
        );
    }

    #[test]
    fn fourth_comma_part_is_rejected() {
        let err = tokenise("add eax, ebx, ecx, edx").unwrap_err();
        assert_eq!(err, ParserError::UnsupportedInstructionFormat);
    }

    #[test]
    fn blank_line_is_empty_input() {
        assert_eq!(tokenise("   ").unwrap_err(), ParserError::EmptyInput);
    }
}
