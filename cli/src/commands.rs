//! Variable expansion and command dispatch (spec §4.4 "Variable expansion",
//! "Commands").

use inasm64::error::CliError;
use inasm64::VariableStore;

const MAX_VARIABLE_NAME_LEN: usize = 32;

/// Replaces every `$name` substring with `0x` followed by the hex value of
/// the looked-up variable, textually, before any command parsing happens
/// (spec §4.4, §6 "Variable syntax").
pub fn expand_variables(line: &str, vars: &VariableStore) -> Result<String, CliError> {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        let mut name = String::new();
        while let Some(&(_, c)) = chars.peek() {
            if (c.is_ascii_alphanumeric() || c == '_') && name.len() < MAX_VARIABLE_NAME_LEN {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            out.push('$');
            continue;
        }
        let value = vars
            .get(&name)
            .ok_or_else(|| CliError::UndefinedVariable(name.clone()))?;
        out.push_str(&format!("0x{value:x}"));
    }
    Ok(out)
}

/// One parsed command verb (spec §4.4 command table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    EnterAssembling,
    Step { address: Option<u64> },
    PrintGprs,
    PrintFlags,
    PrintXmm,
    SetRegister { name: String, value: u64 },
    Help,
    Quit,
    Unknown(String),
}

/// Parses an already-variable-expanded command line into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, CliError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&verb) = tokens.first() else {
        return Err(CliError::InvalidCommandFormat);
    };
    match verb {
        "a" => Ok(Command::EnterAssembling),
        "p" => match tokens.get(1) {
            Some(addr) => Ok(Command::Step {
                address: Some(parse_hex_u64(addr)?),
            }),
            None => Ok(Command::Step { address: None }),
        },
        "r" => match (tokens.get(1), tokens.get(2)) {
            (None, _) => Ok(Command::PrintGprs),
            (Some(name), Some(value)) => Ok(Command::SetRegister {
                name: (*name).to_string(),
                value: parse_hex_u64(value)?,
            }),
            _ => Err(CliError::InvalidCommandFormat),
        },
        "rF" => Ok(Command::PrintFlags),
        "rX" => Ok(Command::PrintXmm),
        "h" => Ok(Command::Help),
        "q" => Ok(Command::Quit),
        other => Ok(Command::Unknown(other.to_string())),
    }
}

fn parse_hex_u64(raw: &str) -> Result<u64, CliError> {
    let stripped = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u64::from_str_radix(stripped, 16).map_err(|_| CliError::InvalidInputValueFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_variable() {
        let mut vars = VariableStore::new();
        vars.set("buffer", 0x1000);
        let out = expand_variables("mov rax, $buffer", &vars).unwrap();
        assert_eq!(out, "mov rax, 0x1000");
    }

    #[test]
    fn undefined_variable_is_rejected() {
        let vars = VariableStore::new();
        let err = expand_variables("mov rax, $nope", &vars).unwrap_err();
        assert_eq!(err, CliError::UndefinedVariable("nope".to_string()));
    }

    #[test]
    fn bare_dollar_is_passed_through() {
        let vars = VariableStore::new();
        let out = expand_variables("echo $", &vars).unwrap();
        assert_eq!(out, "echo $");
    }

    #[test]
    fn single_letter_verbs_parse() {
        assert_eq!(parse_command("a").unwrap(), Command::EnterAssembling);
        assert_eq!(parse_command("r").unwrap(), Command::PrintGprs);
        assert_eq!(parse_command("rF").unwrap(), Command::PrintFlags);
        assert_eq!(parse_command("rX").unwrap(), Command::PrintXmm);
        assert_eq!(parse_command("h").unwrap(), Command::Help);
        assert_eq!(parse_command("q").unwrap(), Command::Quit);
    }

    #[test]
    fn step_with_optional_address() {
        assert_eq!(parse_command("p").unwrap(), Command::Step { address: None });
        assert_eq!(
            parse_command("p 0x1000").unwrap(),
            Command::Step { address: Some(0x1000) }
        );
    }

    #[test]
    fn set_register_parses_name_and_hex_value() {
        assert_eq!(
            parse_command("r eax 0x2a").unwrap(),
            Command::SetRegister {
                name: "eax".to_string(),
                value: 0x2a
            }
        );
    }

    #[test]
    fn unknown_verb_is_preserved_for_delegation() {
        assert_eq!(parse_command("zzz").unwrap(), Command::Unknown("zzz".to_string()));
    }
}
