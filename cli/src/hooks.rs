//! Event callback slots (spec §4.4 "Event callbacks"; grounded on
//! `original_source/inasm64/cli.h`'s `OnDisplayRegister`/`OnStep`/
//! `OnAssembling`/etc.). The core never prints anything itself — it calls
//! these, and the terminal frontend below is just the default wiring of
//! them to stdout.

use inasm64::arch::RegisterId;

type DisplayGprsHook = Box<dyn Fn(&[(RegisterId, u64)])>;
type AssemblingHook = Box<dyn Fn(usize, usize, &[u8])>;
type HelpHook = Box<dyn Fn(&[(&str, &str)])>;

/// The hook slots the CLI core invokes. Each field defaults to a terminal
/// implementation; a different frontend (a test harness, a GUI) can swap
/// any subset of them out.
pub struct Hooks {
    pub on_display_register: Box<dyn Fn(RegisterId, u64)>,
    pub on_display_gp_registers: DisplayGprsHook,
    pub on_display_flags: Box<dyn Fn(u64)>,
    pub on_step: Box<dyn Fn(u64)>,
    pub on_registers_changed: DisplayGprsHook,
    pub on_start_assembling: Box<dyn Fn()>,
    pub on_stop_assembling: Box<dyn Fn()>,
    pub on_assemble_error: Box<dyn Fn(&inasm64::Error)>,
    pub on_assembling: AssemblingHook,
    pub on_quit: Box<dyn Fn()>,
    pub on_help: HelpHook,
    pub on_unknown_command: Box<dyn Fn(&str) -> bool>,
}

impl Default for Hooks {
    fn default() -> Hooks {
        Hooks {
            on_display_register: Box::new(|id, value| println!("{id:?} = 0x{value:x}")),
            on_display_gp_registers: Box::new(|regs| {
                for (id, value) in regs {
                    println!("{id:?} = 0x{value:016x}");
                }
            }),
            on_display_flags: Box::new(|value| println!("eflags = 0x{value:08x}")),
            on_step: Box::new(|address| println!("-> 0x{address:x}")),
            on_registers_changed: Box::new(|regs| {
                for (id, value) in regs {
                    println!("{id:?} <- 0x{value:x}");
                }
            }),
            on_start_assembling: Box::new(|| println!("(assembling, blank line to commit)")),
            on_stop_assembling: Box::new(|| println!("(committed)")),
            on_assemble_error: Box::new(|err| println!("error: {err}")),
            on_assembling: Box::new(|line, address, bytes| {
                let hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ");
                println!("{line}: 0x{address:x}  {hex}");
            }),
            on_quit: Box::new(|| println!("bye")),
            on_help: Box::new(|texts| {
                for (format, description) in texts {
                    println!("{format:<24} {description}");
                }
            }),
            on_unknown_command: Box::new(|cmd| {
                println!("unknown command: {cmd}");
                false
            }),
        }
    }
}

/// Format/description pairs for the `h` command (spec §4.4 command table).
pub const HELP_TEXTS: &[(&str, &str)] = &[
    ("a", "enter assembling mode"),
    ("p [address]", "single-step, optionally jumping the cursor first"),
    ("r", "print all general-purpose registers"),
    ("rF", "print flags"),
    ("rX", "print XMM registers"),
    ("r <reg> <hexvalue>", "set a register"),
    ("h", "show this help"),
    ("q", "shut the runtime down and exit"),
];
