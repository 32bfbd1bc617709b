//! Variable table (spec §3 "Variable table", §4.4 "Variable expansion").
//!
//! Host-side, case-insensitive `name -> u64` map. Values are not
//! self-describing: a "pointer variable" is just a `u64` that happens to
//! hold an address the user allocated elsewhere.

use std::collections::HashMap;

/// `name (case-insensitive) -> u64`.
#[derive(Default)]
pub struct VariableStore {
    values: HashMap<String, u64>,
}

impl VariableStore {
    pub fn new() -> VariableStore {
        VariableStore::default()
    }

    /// Binds `name` to `value`, overwriting any previous binding.
    pub fn set(&mut self, name: &str, value: u64) {
        self.values.insert(name.to_ascii_lowercase(), value);
    }

    /// Looks up `name`, case-insensitively.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.values.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_then_get_is_case_insensitive() {
        let mut vars = VariableStore::new();
        vars.set("Buffer", 0x1000);
        assert_eq!(vars.get("buffer"), Some(0x1000));
        assert_eq!(vars.get("BUFFER"), Some(0x1000));
    }

    #[test]
    fn undefined_variable_is_none() {
        let vars = VariableStore::new();
        assert_eq!(vars.get("nope"), None);
        assert!(!vars.is_defined("nope"));
    }

    #[test]
    fn set_overwrites_previous_binding() {
        let mut vars = VariableStore::new();
        vars.set("x", 1);
        vars.set("x", 2);
        assert_eq!(vars.get("x"), Some(2));
    }
}
