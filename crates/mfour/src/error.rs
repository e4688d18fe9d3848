//! Error types for the macro processor.

use std::io;
use thiserror::Error;

/// Errors raised while expanding input.
///
/// Each top-level expansion step is the recovery boundary in principle;
/// in practice a raised error terminates the run with a diagnostic on
/// stderr. [`Error::Exit`] is not a failure: it carries the exit code
/// requested by `m4exit` up to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot open `{0}`")]
    CannotOpen(String),

    #[error("{file}:{line}: end of file in comment")]
    UnterminatedComment { file: String, line: usize },

    #[error("{file}:{line}: end of file in quoted string")]
    UnterminatedString { file: String, line: usize },

    #[error("end of file in argument list")]
    EofInArguments,

    #[error("too few arguments to builtin `{0}`")]
    TooFewArguments(String),

    #[error("undefined macro `{0}`")]
    UndefinedMacro(String),

    #[error("`{0}` is not a builtin")]
    UnknownBuiltin(String),

    #[error("bad debug flag `{0}`")]
    BadDebugFlag(char),

    #[error("`{0}` is not a valid number")]
    BadNumber(String),

    #[error("radix {0} is not supported")]
    BadRadix(i64),

    #[error("bad expression `{expr}`: {reason}")]
    Eval { expr: String, reason: String },

    #[error("bad format string: {0}")]
    Format(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("recursion limit of {0} exceeded")]
    NestingLimit(usize),

    #[error("shell error: {0}")]
    Shell(#[from] mfour_shell::ShellError),

    #[error("exit({0})")]
    Exit(i32),

    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Result type for processor operations.
pub type Result<T> = std::result::Result<T, Error>;
