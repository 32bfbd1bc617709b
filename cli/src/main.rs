//! Interactive REPL entry point (spec §4.4, §6 "CLI surface").
//!
//! This binary plays two roles depending on how it's invoked: normally it
//! is the interactive assembler/runtime shell; re-invoked with the
//! sentinel argument `262` it is instead the traced child the shell spawned
//! (spec §6 "the child is the same executable re-invoked with one integer
//! argument whose value is 262").

mod commands;
mod hooks;
mod repl;

use std::io::{self, BufRead, Write};

use clap::Parser;
use inasm64_runtime::start_default;
use repl::Cli;

/// Interactive x86-64 assembler and single-step execution sandbox.
#[derive(Parser, Debug)]
#[command(name = "inasm64", about, long_about = None)]
struct Args {
    /// Internal: re-exec sentinel recognised by the traced child. Not for
    /// interactive use.
    #[arg(hide = true)]
    trap_mode: Option<u32>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    #[cfg(target_os = "linux")]
    if args.trap_mode == Some(inasm64::TRAP_MODE_ARGUMENT_VALUE) {
        inasm64_runtime::child::park_as_tracee(inasm64::DEFAULT_CODE_REGION_SIZE);
    }

    let runtime = match start_default() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    let mut cli = Cli::new(runtime);
    let stdin = io::stdin();
    print_prompt(&cli);
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if !cli.execute(&line) {
            std::process::exit(0);
        }
        print_prompt(&cli);
    }
}

fn print_prompt(cli: &Cli) {
    let marker = match cli.active_mode() {
        repl::Mode::Processing => ">",
        repl::Mode::Assembling => "asm>",
    };
    print!("{marker} ");
    io::stdout().flush().ok();
}
