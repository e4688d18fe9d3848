//! The debug/trace sideband.
//!
//! Trace verbosity is a bitmask addressed by one-letter flags (the
//! `debugmode` builtin): `a` arguments, `e` expansion text, `q` quoting,
//! `t` trace-all, `l` line numbers, `f` file names, `p` include-path
//! search, `c` call marker, `i` input changes, `x` call ids, `V`
//! everything, `d` the default set (`aeq`). Trace lines start with
//! `m4trace:` and go to stderr unless `debugfile` redirects them.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::macros::ArgValue;

/// Trace verbosity bits; composable with [`DebugFlags::with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugFlags(u32);

impl DebugFlags {
    pub const NONE: DebugFlags = DebugFlags(0);
    /// `a`: show collected arguments.
    pub const ARGS: DebugFlags = DebugFlags(1);
    /// `e`: show the expansion result.
    pub const EXPANSION: DebugFlags = DebugFlags(1 << 1);
    /// `q`: quote arguments and results with the current delimiters.
    pub const QUOTES: DebugFlags = DebugFlags(1 << 2);
    /// `t`: trace every macro, not only those marked by `traceon`.
    pub const TRACE_ALL: DebugFlags = DebugFlags(1 << 3);
    /// `l`: show the input line number.
    pub const LINES: DebugFlags = DebugFlags(1 << 4);
    /// `f`: show the input file name.
    pub const FILES: DebugFlags = DebugFlags(1 << 5);
    /// `p`: report include-path search results.
    pub const PATH: DebugFlags = DebugFlags(1 << 6);
    /// `c`: also trace before argument collection.
    pub const CALL: DebugFlags = DebugFlags(1 << 7);
    /// `i`: report input-file changes.
    pub const INPUT: DebugFlags = DebugFlags(1 << 8);
    /// `x`: add the call id to trace lines.
    pub const CALL_ID: DebugFlags = DebugFlags(1 << 9);
    /// `V` by itself: also report every builtin invocation.
    pub const VERBOSE: DebugFlags = DebugFlags(1 << 10);

    /// The `d` set.
    pub const DEFAULT: DebugFlags =
        DebugFlags(Self::ARGS.0 | Self::EXPANSION.0 | Self::QUOTES.0);
    /// The `V` set.
    pub const ALL: DebugFlags = DebugFlags((1 << 11) - 1);

    pub fn contains(self, other: DebugFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: DebugFlags) -> DebugFlags {
        DebugFlags(self.0 | other.0)
    }

    pub fn without(self, other: DebugFlags) -> DebugFlags {
        DebugFlags(self.0 & !other.0)
    }

    /// Parses a `debugmode` flag string; the empty string selects the
    /// default set.
    pub fn parse(flags: &str) -> Result<DebugFlags> {
        if flags.is_empty() {
            return Ok(Self::DEFAULT);
        }
        let mut parsed = Self::NONE;
        for ch in flags.chars() {
            parsed = parsed.with(match ch {
                'a' => Self::ARGS,
                'e' => Self::EXPANSION,
                'q' => Self::QUOTES,
                't' => Self::TRACE_ALL,
                'l' => Self::LINES,
                'f' => Self::FILES,
                'p' => Self::PATH,
                'c' => Self::CALL,
                'i' => Self::INPUT,
                'x' => Self::CALL_ID,
                'd' => Self::DEFAULT,
                'V' => Self::ALL,
                other => return Err(Error::BadDebugFlag(other)),
            });
        }
        Ok(parsed)
    }
}

impl Default for DebugFlags {
    fn default() -> Self {
        DebugFlags::DEFAULT
    }
}

/// Formats pre/post-expansion records to the sideband stream.
pub struct Tracer {
    pub flags: DebugFlags,
    sink: Box<dyn Write>,
}

impl Tracer {
    pub fn new() -> Self {
        Tracer {
            flags: DebugFlags::default(),
            sink: Box::new(io::stderr()),
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn Write>) {
        self.sink = sink;
    }

    /// Redirects trace output to a file; `None` restores stderr.
    pub fn set_output_file(&mut self, path: Option<&Path>) -> Result<()> {
        self.sink = match path {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(io::stderr()),
        };
        Ok(())
    }

    fn head(&self, position: Option<(&str, usize)>, level: usize, id: u64) -> String {
        let mut head = String::from("m4trace:");
        if let Some((file, line)) = position {
            if self.flags.contains(DebugFlags::FILES) {
                head.push_str(file);
                head.push(':');
            }
            if self.flags.contains(DebugFlags::LINES) {
                let _ = write!(head, "{line}:");
            }
        }
        let _ = write!(head, " -{level}- ");
        if self.flags.contains(DebugFlags::CALL_ID) {
            let _ = write!(head, "id {id}: ");
        }
        head
    }

    fn maybe_quote(&self, text: &str, quotes: (&str, &str)) -> String {
        if self.flags.contains(DebugFlags::QUOTES) {
            format!("{}{}{}", quotes.0, text, quotes.1)
        } else {
            text.to_string()
        }
    }

    /// Record emitted before argument collection (`c` flag).
    pub fn trace_call(
        &mut self,
        position: Option<(&str, usize)>,
        level: usize,
        id: u64,
        name: &str,
    ) -> Result<()> {
        if !self.flags.contains(DebugFlags::CALL) {
            return Ok(());
        }
        writeln!(self.sink, "{}{} ...", self.head(position, level, id), name)?;
        Ok(())
    }

    /// Record emitted after argument collection, before invocation.
    pub fn trace_pre(
        &mut self,
        position: Option<(&str, usize)>,
        level: usize,
        id: u64,
        name: &str,
        args: &[ArgValue],
        quotes: (&str, &str),
    ) -> Result<()> {
        let mut record = format!("{}{}", self.head(position, level, id), name);
        if self.flags.contains(DebugFlags::ARGS) && args.len() > 1 {
            let rendered: Vec<String> = args[1..]
                .iter()
                .map(|arg| self.maybe_quote(arg.as_text(), quotes))
                .collect();
            let _ = write!(record, "({})", rendered.join(", "));
        }
        writeln!(self.sink, "{record}")?;
        Ok(())
    }

    /// Record carrying the expansion result (`e` flag).
    pub fn trace_post(
        &mut self,
        position: Option<(&str, usize)>,
        level: usize,
        id: u64,
        name: &str,
        result: Option<&str>,
        quotes: (&str, &str),
    ) -> Result<()> {
        if !self.flags.contains(DebugFlags::EXPANSION) {
            return Ok(());
        }
        let rendered = match result {
            Some(text) => format!(" -> {}", self.maybe_quote(text, quotes)),
            None => String::new(),
        };
        writeln!(
            self.sink,
            "{}{}{}",
            self.head(position, level, id),
            name,
            rendered
        )?;
        Ok(())
    }

    /// Free-form sideband report, gated on `flag` (path search, input
    /// changes, builtin calls).
    pub fn report(&mut self, flag: DebugFlags, message: &str) -> Result<()> {
        if !self.flags.contains(flag) {
            return Ok(());
        }
        writeln!(self.sink, "m4debug: {message}")?;
        Ok(())
    }

    /// Unconditional sideband output (`dumpdef`).
    pub fn dump(&mut self, text: &str) -> Result<()> {
        writeln!(self.sink, "{text}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Tracer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_combines_letters() {
        let flags = DebugFlags::parse("aeq").unwrap();
        assert!(flags.contains(DebugFlags::ARGS));
        assert!(flags.contains(DebugFlags::EXPANSION));
        assert!(flags.contains(DebugFlags::QUOTES));
        assert!(!flags.contains(DebugFlags::TRACE_ALL));
    }

    #[test]
    fn parse_empty_is_default() {
        assert_eq!(DebugFlags::parse("").unwrap(), DebugFlags::DEFAULT);
        assert_eq!(DebugFlags::parse("d").unwrap(), DebugFlags::DEFAULT);
    }

    #[test]
    fn parse_v_selects_everything() {
        let flags = DebugFlags::parse("V").unwrap();
        assert!(flags.contains(DebugFlags::CALL_ID));
        assert!(flags.contains(DebugFlags::VERBOSE));
        assert!(flags.contains(DebugFlags::TRACE_ALL));
    }

    #[test]
    fn parse_rejects_unknown_letters() {
        assert!(matches!(
            DebugFlags::parse("az"),
            Err(Error::BadDebugFlag('z'))
        ));
    }

    #[test]
    fn with_and_without_toggle_bits() {
        let flags = DebugFlags::NONE.with(DebugFlags::TRACE_ALL);
        assert!(flags.contains(DebugFlags::TRACE_ALL));
        assert!(!flags.without(DebugFlags::TRACE_ALL).contains(DebugFlags::TRACE_ALL));
    }
}
