//! # mfour: an m4-style macro processor
//!
//! mfour reads text containing macro invocations and emits the text with
//! those invocations expanded. Macros are defined in the input (text
//! templates with `$1`-style parameters) or provided as builtins
//! (string manipulation, conditionals, arithmetic, file inclusion,
//! output diversion, tracing, shell escape).
//!
//! The engine is a classic pushback expander: a layered input stack
//! yields one character stream, the tokenizer segments it under the
//! currently configured quote/comment delimiters, and every macro result
//! is pushed back onto the input and rescanned before the surrounding
//! text continues.
//!
//! # Example
//!
//! ```rust
//! use mfour::{expand, Config};
//!
//! let mut config = Config::default();
//! config.sync_output = false;
//!
//! let output = expand("define(`greet', `hello $1!')greet(`world')", config).unwrap();
//! assert_eq!(output, "hello world!");
//! ```
//!
//! # Pieces
//!
//! - [`Config`]: delimiters, limits, flags and the include path
//! - [`Processor`]: owns the input stack, macro table, diversions and
//!   sinks; [`Processor::process_file`] and [`Processor::process_string`]
//!   drive the token loop
//! - [`builtins`]: the builtin table and its registration rules
//! - [`DebugFlags`]: trace verbosity for the `m4trace:` sideband
//!
//! Output sinks are plain [`std::io::Write`] trait objects, so tests and
//! embedders capture output with [`CaptureBuffer`] instead of touching
//! the real stdout.

pub mod builtins;
pub mod config;
mod divert;
pub mod error;
mod expand;
mod input;
mod lexer;
pub mod eval;
pub mod macros;
mod processor;
pub mod token;
mod trace;

pub use builtins::BuiltinId;
pub use config::Config;
pub use error::{Error, Result};
pub use macros::{ArgValue, Definition, Macro, MacroTable};
pub use processor::{CaptureBuffer, Processor};
pub use token::{Token, TokenKind};
pub use trace::DebugFlags;

/// Expands `input` under `config` and returns the produced output.
///
/// This is the one-shot convenience wrapper around [`Processor`]; errors
/// from the expansion (including `m4exit` as [`Error::Exit`]) pass
/// through.
pub fn expand(input: &str, config: Config) -> Result<String> {
    let captured = CaptureBuffer::new();
    let mut processor = Processor::new(config).with_output(Box::new(captured.clone()));
    processor.process_string(input)?;
    Ok(captured.contents())
}
