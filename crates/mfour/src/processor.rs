//! The processor: owner of all engine state and the output sinks.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use crate::builtins;
use crate::config::Config;
use crate::divert::Diversions;
use crate::error::Result;
use crate::input::InputStack;
use crate::macros::{ArgValue, Definition, MacroTable};
use crate::trace::{DebugFlags, Tracer};

/// The macro processor.
///
/// Owns the input stack, the macro table, the diversion map and the
/// sinks. Builtins receive it by mutable reference and may mutate any of
/// this state; execution is strictly serial, so no locking is involved.
pub struct Processor {
    pub config: Config,
    pub(crate) input: InputStack,
    pub macros: MacroTable,
    pub(crate) diversions: Diversions,
    pub(crate) tracer: Tracer,
    pub(crate) output: Box<dyn Write>,
    pub(crate) stderr: Box<dyn Write>,
    pub(crate) expansion_level: usize,
    pub(crate) macro_call_id: u64,
    pub(crate) wrap_queue: VecDeque<String>,
    /// Exit status of the last `syscmd`/`esyscmd`, reported by `sysval`.
    pub returncode: i32,
    pub(crate) pending_comments: Vec<String>,
}

impl Processor {
    /// Creates a processor with the builtin set installed per `config`,
    /// writing to the real stdout/stderr.
    pub fn new(config: Config) -> Self {
        let mut macros = MacroTable::new();
        builtins::install(&mut macros, &config);
        Processor {
            config,
            input: InputStack::new(),
            macros,
            diversions: Diversions::new(),
            tracer: Tracer::new(),
            output: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
            expansion_level: 0,
            macro_call_id: 0,
            wrap_queue: VecDeque::new(),
            returncode: 0,
            pending_comments: Vec::new(),
        }
    }

    /// Replaces the output sink.
    pub fn with_output(mut self, sink: Box<dyn Write>) -> Self {
        self.output = sink;
        self
    }

    /// Replaces the stderr sink (diagnostics, warnings, `errprint`).
    pub fn with_stderr(mut self, sink: Box<dyn Write>) -> Self {
        self.stderr = sink;
        self
    }

    /// Replaces the trace sink.
    pub fn with_trace_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.tracer.set_sink(sink);
        self
    }

    pub fn debug_flags(&self) -> DebugFlags {
        self.tracer.flags
    }

    pub fn set_debug_flags(&mut self, flags: DebugFlags) {
        self.tracer.flags = flags;
    }

    /// Redirects trace output to a file; `None` restores stderr.
    pub fn set_trace_file(&mut self, path: Option<&Path>) -> Result<()> {
        self.tracer.set_output_file(path)
    }

    /// The nearest file on the input stack, as `(name, line)`.
    pub fn current_file(&self) -> Option<(&str, usize)> {
        self.input.current_file()
    }

    /// Wraps `text` in the current quote delimiters.
    pub(crate) fn quote(&self, text: &str) -> String {
        format!("{}{}{}", self.config.left_quote, text, self.config.right_quote)
    }

    pub(crate) fn warn(&mut self, message: impl AsRef<str>) {
        let _ = writeln!(
            self.stderr,
            "{}: warning: {}",
            self.config.program_name,
            message.as_ref()
        );
    }

    pub(crate) fn write_stderr(&mut self, text: &str) -> Result<()> {
        self.stderr.write_all(text.as_bytes())?;
        self.stderr.flush()?;
        Ok(())
    }

    /// Single entry point for scanned-but-not-expanded text headed to
    /// the output; routes through the current diversion.
    pub(crate) fn shipout_text(&mut self, text: &str, line: usize) -> Result<()> {
        let file = self.input.current_file().map(|(name, _)| name);
        self.diversions
            .ship(text, file, line, self.config.sync_output, &mut self.output)
    }

    pub(crate) fn undivert_one(&mut self, id: i32) -> Result<()> {
        self.diversions.undivert(id, &mut self.output)
    }

    pub(crate) fn undivert_all(&mut self) -> Result<()> {
        self.diversions.undivert_all(&mut self.output)
    }

    pub(crate) fn take_wrap(&mut self) -> Option<String> {
        self.wrap_queue.pop_front()
    }

    /// Hands out the comment lines collected since the last blank line;
    /// they document the next defined macro.
    pub(crate) fn take_pending_doc(&mut self) -> Option<String> {
        if self.pending_comments.is_empty() {
            return None;
        }
        let doc = self.pending_comments.join("\n");
        self.pending_comments.clear();
        Some(doc)
    }

    /// Prints one macro definition to the debug sink.
    pub(crate) fn dump_macro(&mut self, name: &str) {
        let entry = self
            .macros
            .lookup(name)
            .map(|mac| (mac.def.clone(), mac.doc.clone()));
        match entry {
            Some((def, doc)) => {
                let rendered = match def {
                    Definition::Text(body) => self.quote(&body),
                    Definition::Builtin(id) => format!("<{}>", builtins::spec(id).name),
                };
                if let Some(doc) = doc {
                    let _ = self.tracer.dump(&doc);
                }
                let _ = self.tracer.dump(&format!("{name}:\t{rendered}"));
            }
            None => self.warn(format!("undefined macro `{name}'")),
        }
    }

    /// Reports a builtin invocation to the debug sink (`V` flag).
    pub(crate) fn report_builtin_call(&mut self, name: &str, args: &[ArgValue]) {
        if !self.tracer.flags.contains(DebugFlags::VERBOSE) {
            return;
        }
        let rendered: Vec<&str> = args[1..].iter().map(ArgValue::as_text).collect();
        let _ = self
            .tracer
            .report(DebugFlags::VERBOSE, &format!("builtin {}({})", name, rendered.join(", ")));
    }

    /// Flushes the output, trace and stderr sinks.
    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        self.tracer.flush()?;
        let _ = self.stderr.flush();
        Ok(())
    }
}

/// An in-memory sink that can be read back after the processor is done
/// with it; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Rc<RefCell<Vec<u8>>>);

impl CaptureBuffer {
    pub fn new() -> Self {
        CaptureBuffer::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
