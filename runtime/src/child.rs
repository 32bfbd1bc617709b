//! The sentinel re-exec and the child's own parking sequence (spec §4.3
//! "Model", spec §6 "the child is the same executable re-invoked with one
//! integer argument whose value is 262").
//!
//! Remote allocation of executable memory inside an already-running peer
//! process has no portable Linux primitive short of code injection. The
//! child therefore reserves its own code and data regions, at addresses
//! fixed by this module, before parking — the parent never needs to
//! discover them by IPC, only to agree on the same constants.

use inasm64::TRAP_MODE_ARGUMENT_VALUE;
use nix::sys::ptrace;
use nix::sys::signal::{raise, Signal};

/// Base address of the child's executable scratch region. Chosen well
/// outside the range a non-PIE or ASLR'd PIE binary's own segments or
/// stack/heap would occupy.
pub const CODE_REGION_BASE: usize = 0x0000_6f00_0000_0000;

/// Base address of the child's read-write data pool, directly above the
/// code region.
pub const DATA_REGION_BASE: usize = CODE_REGION_BASE + 0x0010_0000;

/// Size of the data pool `AllocateMemory` bump-allocates from.
pub const DATA_REGION_SIZE: usize = 16 * 1024 * 1024;

/// True when this process was re-invoked as the runtime's debuggee (spec
/// §6).
pub fn is_trap_mode_invocation(args: &[String]) -> bool {
    args.get(1)
        .and_then(|a| a.parse::<u32>().ok())
        .is_some_and(|v| v == TRAP_MODE_ARGUMENT_VALUE)
}

/// Entry point for a process invoked with the sentinel argument: reserves
/// the code and data regions, hands control to the tracer, and parks.
/// Never returns under normal operation — the tracer redirects this
/// process's instruction pointer into the code region and drives it one
/// instruction at a time from then on.
#[cfg(target_os = "linux")]
pub fn park_as_tracee(code_region_size: usize) -> ! {
    reserve_region(CODE_REGION_BASE, code_region_size, true);
    reserve_region(DATA_REGION_BASE, DATA_REGION_SIZE, false);

    ptrace::traceme().expect("PTRACE_TRACEME failed");
    raise(Signal::SIGSTOP).expect("failed to stop for tracer attachment");

    // The tracer redirects RIP before resuming us; if it never does (e.g.
    // a stray re-exec outside the runtime), sit here rather than running
    // off into whatever code happened to follow main().
    loop {
        raise(Signal::SIGSTOP).ok();
    }
}

#[cfg(target_os = "linux")]
fn reserve_region(addr: usize, size: usize, executable: bool) {
    use nix::libc::{
        mmap, MAP_ANONYMOUS, MAP_FIXED_NOREPLACE, MAP_PRIVATE, PROT_EXEC, PROT_READ, PROT_WRITE,
    };
    let mut prot = PROT_READ | PROT_WRITE;
    if executable {
        prot |= PROT_EXEC;
    }
    let ptr = unsafe {
        mmap(
            addr as *mut core::ffi::c_void,
            size,
            prot,
            MAP_PRIVATE | MAP_ANONYMOUS | MAP_FIXED_NOREPLACE,
            -1,
            0,
        )
    };
    assert_eq!(ptr as usize, addr, "failed to reserve fixed region at {addr:#x}");
}
