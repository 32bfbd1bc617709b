//! The traced child process (spec §4.3 "Model"): spawn the sentinel
//! re-exec, redirect its instruction pointer into the reserved code
//! region, then drive it forward one instruction at a time via
//! `PTRACE_SINGLESTEP`, reporting which registers changed after each step.
//!
//! Grounded on the `mttn` tracer's step/wait/snapshot loop: `ptrace::step`
//! plus `waitpid` classification is the same shape, simplified here to a
//! single child with no multi-threaded bookkeeping.

use std::os::unix::fs::FileExt;

use inasm64::arch::RegisterId;
use inasm64::error::RuntimeError;
use inasm64::DEFAULT_CODE_REGION_SIZE;

use crate::child::{CODE_REGION_BASE, DATA_REGION_BASE, DATA_REGION_SIZE};
use crate::code_region::CodeRegion;
use crate::data_region::{DataHandle, DataRegion};
use crate::registers::{self, RegisterSnapshot};

/// What happened in the child as a result of one `step()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// The child executed exactly one instruction and trapped as expected.
    Trapped,
    /// The child touched memory it has no access to.
    AccessViolation,
    /// The child ran off the end of its own process (should not happen in
    /// normal operation; surfaces a runaway or missing instruction).
    Exited(i32),
}

/// Registers whose value differs from the previous snapshot (spec §4.3
/// "change-set reporting").
pub type ChangeSet = Vec<(RegisterId, u64)>;

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use nix::sys::ptrace;
    use nix::sys::signal::Signal;
    use nix::sys::wait::{waitpid, WaitStatus};
    use nix::unistd::Pid;
    use std::fs::{File, OpenOptions};
    use std::process::{Child, Command};

    pub struct Runtime {
        child: Child,
        pid: Pid,
        mem: File,
        code_region: CodeRegion,
        data_region: DataRegion,
        previous: RegisterSnapshot,
    }

    impl Runtime {
        pub fn start(code_region_size: usize) -> Result<Runtime, RuntimeError> {
            let exe = std::env::current_exe()
                .map_err(|e| RuntimeError::SystemError(e.to_string()))?;
            let child = Command::new(exe)
                .arg(inasm64::TRAP_MODE_ARGUMENT_VALUE.to_string())
                .spawn()
                .map_err(|e| RuntimeError::SystemError(e.to_string()))?;
            let pid = Pid::from_raw(child.id() as i32);

            match waitpid(pid, None).map_err(nix_err)? {
                WaitStatus::Stopped(_, Signal::SIGSTOP) => {}
                other => {
                    return Err(RuntimeError::SystemError(format!(
                        "unexpected initial wait status: {other:?}"
                    )))
                }
            }
            ptrace::setoptions(pid, ptrace::Options::PTRACE_O_EXITKILL).map_err(nix_err)?;

            let mut regs = ptrace::getregs(pid).map_err(nix_err)?;
            regs.rip = CODE_REGION_BASE as u64;
            ptrace::setregs(pid, regs).map_err(nix_err)?;

            let mem = OpenOptions::new()
                .read(true)
                .write(true)
                .open(format!("/proc/{pid}/mem"))
                .map_err(|e| RuntimeError::SystemError(e.to_string()))?;

            let previous = RegisterSnapshot::from_ptrace(&regs);

            Ok(Runtime {
                child,
                pid,
                mem,
                code_region: CodeRegion::new(CODE_REGION_BASE, code_region_size.max(1)),
                data_region: DataRegion::new(DATA_REGION_BASE, DATA_REGION_SIZE),
                previous,
            })
        }

        pub fn add_instruction(&mut self, bytes: &[u8]) -> Result<usize, RuntimeError> {
            self.code_region.add_instruction(bytes)
        }

        pub fn commit_instructions(&mut self) -> Result<(), RuntimeError> {
            for (addr, bytes) in self.code_region.commit() {
                self.mem
                    .write_at(&bytes, addr as u64)
                    .map_err(|e| RuntimeError::SystemError(e.to_string()))?;
            }
            Ok(())
        }

        pub fn code_region_base(&self) -> usize {
            self.code_region.base()
        }

        /// Whether `address` falls inside the reserved code region (spec
        /// §9's recommended safe policy for `p <address>`).
        pub fn code_region_contains(&self, address: u64) -> bool {
            self.code_region.contains(address as usize)
        }

        pub fn allocate_memory(&mut self, size: usize) -> Result<DataHandle, RuntimeError> {
            self.data_region.allocate(size)
        }

        pub fn write_bytes(&mut self, handle: DataHandle, bytes: &[u8]) -> Result<(), RuntimeError> {
            self.data_region.check_write(handle, bytes)?;
            self.mem
                .write_at(bytes, handle.address as u64)
                .map_err(|e| RuntimeError::SystemError(e.to_string()))?;
            Ok(())
        }

        pub fn read_bytes(&mut self, handle: DataHandle, len: usize) -> Result<Vec<u8>, RuntimeError> {
            self.data_region.check_read(handle, len)?;
            let mut buf = vec![0u8; len];
            self.mem
                .read_at(&mut buf, handle.address as u64)
                .map_err(|e| RuntimeError::SystemError(e.to_string()))?;
            Ok(buf)
        }

        pub fn get_reg(&self, id: RegisterId) -> Result<u64, RuntimeError> {
            let regs = ptrace::getregs(self.pid).map_err(nix_err)?;
            registers::get_reg(&RegisterSnapshot::from_ptrace(&regs), id)
        }

        pub fn set_reg(&mut self, id: RegisterId, value: u64) -> Result<(), RuntimeError> {
            let mut regs = ptrace::getregs(self.pid).map_err(nix_err)?;
            let mut snapshot = RegisterSnapshot::from_ptrace(&regs);
            registers::set_reg(&mut snapshot, id, value)?;
            snapshot.apply_to_ptrace(&mut regs);
            ptrace::setregs(self.pid, regs).map_err(nix_err)?;
            Ok(())
        }

        pub fn instruction_pointer(&self) -> Result<u64, RuntimeError> {
            self.get_reg(RegisterId::rip)
        }

        /// Executes exactly one instruction and returns the registers that
        /// changed since the previous step (spec §4.3).
        pub fn step(&mut self) -> Result<(StepEvent, ChangeSet), RuntimeError> {
            ptrace::step(self.pid, None).map_err(nix_err)?;
            let event = match waitpid(self.pid, None).map_err(nix_err)? {
                WaitStatus::Stopped(_, Signal::SIGTRAP) => StepEvent::Trapped,
                WaitStatus::Stopped(_, Signal::SIGSEGV) => StepEvent::AccessViolation,
                WaitStatus::Exited(_, code) => StepEvent::Exited(code),
                other => {
                    return Err(RuntimeError::SystemError(format!(
                        "unexpected wait status: {other:?}"
                    )))
                }
            };
            if matches!(event, StepEvent::Exited(_)) {
                return Ok((event, Vec::new()));
            }
            if matches!(event, StepEvent::AccessViolation) {
                return Err(RuntimeError::AccessViolation);
            }
            let regs = ptrace::getregs(self.pid).map_err(nix_err)?;
            let snapshot = RegisterSnapshot::from_ptrace(&regs);
            let changes = registers::tracked_ids()
                .filter_map(|id| {
                    let before = registers::get_reg(&self.previous, id).ok()?;
                    let after = registers::get_reg(&snapshot, id).ok()?;
                    (before != after).then_some((id, after))
                })
                .collect();
            self.previous = snapshot;
            Ok((event, changes))
        }

        pub fn shutdown(mut self) -> Result<(), RuntimeError> {
            ptrace::kill(self.pid).ok();
            self.child.wait().ok();
            Ok(())
        }
    }

    fn nix_err(e: nix::Error) -> RuntimeError {
        RuntimeError::SystemError(e.to_string())
    }
}

#[cfg(target_os = "linux")]
pub use linux::Runtime;

#[cfg(not(target_os = "linux"))]
pub struct Runtime;

#[cfg(not(target_os = "linux"))]
impl Runtime {
    pub fn start(_code_region_size: usize) -> Result<Runtime, RuntimeError> {
        Err(RuntimeError::SystemError(
            "single-step execution is only supported on Linux".into(),
        ))
    }
}

/// Convenience constructor using the spec's default code region size.
pub fn start_default() -> Result<Runtime, RuntimeError> {
    Runtime::start(DEFAULT_CODE_REGION_SIZE)
}
