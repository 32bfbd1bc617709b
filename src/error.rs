//! The flat error taxonomy from spec §7, realized as a `thiserror`-derived
//! enum per subsystem composed into one [`Error`].
//!
//! The original carries a single process-wide last-error code (`GetError` in
//! `common.h`). Most callers should just propagate `Result`; [`last_error`]
//! is kept as a parameter-free mirror for the CLI's callback slots, which
//! cannot carry a return value of their own (spec §9 "Last-error slot").

use std::cell::Cell;
use thiserror::Error;

/// Parser-stage failures (spec §7 "Parser").
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserError {
    #[error("empty input")]
    EmptyInput,
    #[error("invalid instruction format")]
    InvalidInstructionFormat,
    #[error("invalid operand format")]
    InvalidOperandFormat,
    #[error("invalid operand scale")]
    InvalidOperandScale,
    #[error("unsupported instruction format")]
    UnsupportedInstructionFormat,
}

/// Encoder-stage failures (spec §7 "Encoder").
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    #[error("invalid instruction name")]
    InvalidInstructionName,
    #[error("invalid destination register name")]
    InvalidDestRegisterName,
    #[error("operand sizes mismatch")]
    OperandSizesMismatch,
    #[error("invalid immediate operand bit width")]
    InvalidImmediateOperandBitWidth,
    #[error("encode error")]
    EncodeError,
    #[error("unsupported CPU feature")]
    UnsupportedCpuFeature,
    #[error("unsupported instruction type")]
    UnsupportedInstructionType,
    #[error("code buffer full")]
    CodeBufferFull,
}

/// Runtime failures (spec §7 "Runtime").
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("runtime uninitialised")]
    RuntimeUninitialised,
    #[error("code buffer full")]
    CodeBufferFull,
    #[error("code buffer overflow")]
    CodeBufferOverflow,
    #[error("no more code")]
    NoMoreCode,
    #[error("invalid address")]
    InvalidAddress,
    #[error("access violation")]
    AccessViolation,
    #[error("memory read size mismatch")]
    MemoryReadSizeMismatch,
    #[error("memory write size mismatch")]
    MemoryWriteSizeMismatch,
    #[error("system error: {0}")]
    SystemError(String),
}

/// CLI-stage failures (spec §7 "CLI").
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    #[error("CLI uninitialised")]
    CliUninitialised,
    #[error("input length exceeded")]
    CliInputLengthExceeded,
    #[error("unknown command")]
    CliUnknownCommand,
    #[error("invalid command format")]
    InvalidCommandFormat,
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("invalid input value format")]
    InvalidInputValueFormat,
    #[error("unrecognized register name: {0}")]
    UnrecognizedRegisterName(String),
    #[error("invalid register name")]
    InvalidRegisterName,
}

/// Top-level error, composing every subsystem's taxonomy (spec §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Cli(#[from] CliError),
}

/// A coarse kind used by the last-error mirror, since callback slots only
/// need to know *that* something failed, not the full error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parser,
    Encode,
    Runtime,
    Cli,
}

impl From<&Error> for ErrorKind {
    fn from(err: &Error) -> ErrorKind {
        match err {
            Error::Parser(_) => ErrorKind::Parser,
            Error::Encode(_) => ErrorKind::Encode,
            Error::Runtime(_) => ErrorKind::Runtime,
            Error::Cli(_) => ErrorKind::Cli,
        }
    }
}

thread_local! {
    static LAST_ERROR: Cell<Option<ErrorKind>> = const { Cell::new(None) };
}

/// Records `err`'s kind in the last-error slot and returns it unchanged, so
/// callers can thread this through `?` at a fallible call site:
/// `do_thing().map_err(set_last_error)?`.
pub fn set_last_error(err: Error) -> Error {
    LAST_ERROR.with(|slot| slot.set(Some(ErrorKind::from(&err))));
    err
}

/// The kind of the most recently recorded error, if any.
pub fn last_error() -> Option<ErrorKind> {
    LAST_ERROR.with(|slot| slot.get())
}

pub type Result<T> = std::result::Result<T, Error>;
