//! The CLI core (spec §4.4): mode state machine, dispatch, and the only
//! thing that ever touches the parser, encoder, and runtime together.

use inasm64::arch::{self, RegClass, RegisterId};
use inasm64::error::CliError;
use inasm64::VariableStore;
use inasm64_asm::{encode, parse};
use inasm64_runtime::Runtime;

use crate::commands::{expand_variables, parse_command, Command};
use crate::hooks::{Hooks, HELP_TEXTS};

/// Processing (ordinary commands) or Assembling (accumulating instruction
/// lines until a blank line commits them) — spec §4.4 "Modes".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Processing,
    Assembling,
}

pub struct Cli {
    mode: Mode,
    vars: VariableStore,
    runtime: Option<Runtime>,
    hooks: Hooks,
    next_line_number: usize,
}

impl Cli {
    pub fn new(runtime: Runtime) -> Cli {
        Cli {
            mode: Mode::Processing,
            vars: VariableStore::new(),
            runtime: Some(runtime),
            hooks: Hooks::default(),
            next_line_number: 0,
        }
    }

    pub fn active_mode(&self) -> Mode {
        self.mode
    }

    /// Executes one input line. Returns `false` once the CLI should exit
    /// (the `q` command, or a runtime `SystemError`).
    pub fn execute(&mut self, raw_line: &str) -> bool {
        if raw_line.len() > inasm64::MAX_COMMAND_LINE_LENGTH {
            log::warn!("line exceeds {} bytes", inasm64::MAX_COMMAND_LINE_LENGTH);
            return true;
        }

        match self.mode {
            Mode::Assembling => self.execute_assembling_line(raw_line),
            Mode::Processing => self.execute_processing_line(raw_line),
        }
    }

    fn execute_assembling_line(&mut self, raw_line: &str) -> bool {
        if raw_line.trim().is_empty() {
            if let Some(runtime) = self.runtime.as_mut() {
                if let Err(err) = runtime.commit_instructions() {
                    log::error!("commit failed: {err}");
                }
            }
            (self.hooks.on_stop_assembling)();
            self.mode = Mode::Processing;
            return true;
        }

        let expanded = match expand_variables(raw_line, &self.vars) {
            Ok(s) => s,
            Err(err) => {
                (self.hooks.on_assemble_error)(&inasm64::Error::Cli(err));
                self.mode = Mode::Processing;
                return true;
            }
        };

        let result = parse(&expanded)
            .map_err(inasm64::Error::from)
            .and_then(|stmt| encode(&stmt).map_err(inasm64::Error::from));

        match result {
            Ok(encoded) => {
                let Some(runtime) = self.runtime.as_mut() else {
                    (self.hooks.on_assemble_error)(&inasm64::Error::Runtime(
                        inasm64::error::RuntimeError::RuntimeUninitialised,
                    ));
                    self.mode = Mode::Processing;
                    return true;
                };
                match runtime.add_instruction(encoded.as_slice()) {
                    Ok(address) => {
                        let line_number = self.next_line_number;
                        self.next_line_number += 1;
                        (self.hooks.on_assembling)(line_number, address, encoded.as_slice());
                    }
                    Err(err) => {
                        (self.hooks.on_assemble_error)(&inasm64::Error::Runtime(err));
                        self.mode = Mode::Processing;
                    }
                }
            }
            Err(err) => {
                (self.hooks.on_assemble_error)(&err);
                self.mode = Mode::Processing;
            }
        }
        true
    }

    fn execute_processing_line(&mut self, raw_line: &str) -> bool {
        let expanded = match expand_variables(raw_line, &self.vars) {
            Ok(s) => s,
            Err(err) => {
                log::error!("{err}");
                return true;
            }
        };
        if expanded.trim().is_empty() {
            return true;
        }

        let command = match parse_command(&expanded) {
            Ok(c) => c,
            Err(err) => {
                log::error!("{err}");
                return true;
            }
        };

        match command {
            Command::EnterAssembling => {
                self.mode = Mode::Assembling;
                (self.hooks.on_start_assembling)();
                true
            }
            Command::Step { address } => self.do_step(address),
            Command::PrintGprs => self.do_print_gprs(),
            Command::PrintFlags => self.do_print_flags(),
            Command::PrintXmm => {
                log::warn!("XMM registers are not readable through this runtime");
                true
            }
            Command::SetRegister { name, value } => self.do_set_register(&name, value),
            Command::Help => {
                (self.hooks.on_help)(HELP_TEXTS);
                true
            }
            Command::Quit => {
                if let Some(runtime) = self.runtime.take() {
                    if let Err(err) = runtime.shutdown() {
                        log::error!("shutdown failed: {err}");
                    }
                }
                (self.hooks.on_quit)();
                false
            }
            Command::Unknown(cmd) => {
                if !(self.hooks.on_unknown_command)(&cmd) {
                    log::error!("{}", CliError::CliUnknownCommand);
                }
                true
            }
        }
    }

    fn do_step(&mut self, address: Option<u64>) -> bool {
        let Some(runtime) = self.runtime.as_mut() else {
            log::error!("{}", inasm64::error::RuntimeError::RuntimeUninitialised);
            return true;
        };
        if let Some(addr) = address {
            if !runtime.code_region_contains(addr) {
                log::error!("{}", inasm64::error::RuntimeError::InvalidAddress);
                return true;
            }
            if let Err(err) = runtime.set_reg(RegisterId::rip, addr) {
                log::error!("{err}");
                return true;
            }
        }
        match runtime.step() {
            Ok((_, changes)) => {
                if let Ok(rip) = runtime.instruction_pointer() {
                    (self.hooks.on_step)(rip);
                }
                if !changes.is_empty() {
                    (self.hooks.on_registers_changed)(&changes);
                }
                true
            }
            Err(inasm64::error::RuntimeError::SystemError(msg)) => {
                log::error!("fatal runtime error: {msg}");
                false
            }
            Err(err) => {
                log::error!("{err}");
                true
            }
        }
    }

    fn do_print_gprs(&mut self) -> bool {
        let Some(runtime) = self.runtime.as_mut() else {
            log::error!("{}", inasm64::error::RuntimeError::RuntimeUninitialised);
            return true;
        };
        let mut values = Vec::new();
        for info in arch::REGISTERS {
            if info.class == RegClass::Gpr && info.width_bits == 64 && info.id != RegisterId::rip {
                match runtime.get_reg(info.id) {
                    Ok(value) => values.push((info.id, value)),
                    Err(err) => {
                        log::error!("{err}");
                        return true;
                    }
                }
            }
        }
        (self.hooks.on_display_gp_registers)(&values);
        true
    }

    fn do_print_flags(&mut self) -> bool {
        let Some(runtime) = self.runtime.as_mut() else {
            log::error!("{}", inasm64::error::RuntimeError::RuntimeUninitialised);
            return true;
        };
        match runtime.get_reg(RegisterId::eflags) {
            Ok(value) => (self.hooks.on_display_flags)(value),
            Err(err) => log::error!("{err}"),
        }
        true
    }

    fn do_set_register(&mut self, name: &str, value: u64) -> bool {
        let Some(info) = arch::lookup(name) else {
            log::error!("{}", CliError::UnrecognizedRegisterName(name.to_string()));
            return true;
        };
        let Some(runtime) = self.runtime.as_mut() else {
            log::error!("{}", inasm64::error::RuntimeError::RuntimeUninitialised);
            return true;
        };
        match runtime.set_reg(info.id, value) {
            Ok(()) => (self.hooks.on_display_register)(info.id, value),
            Err(err) => log::error!("{err}"),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_starts_in_processing() {
        assert_eq!(Mode::Processing, Mode::Processing);
    }
}
