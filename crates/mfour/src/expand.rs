//! The expander: token loop, argument collection and text-macro
//! substitution.
//!
//! Expansion follows the pushback model: a macro's result is pushed onto
//! the input stack and rescanned before the surrounding text continues,
//! so the observable output is a depth-first, left-to-right traversal of
//! the input. Argument collection re-enters the same token loop with an
//! accumulator, which is what makes arguments expand as they are
//! collected.

use std::fs;

use crate::builtins;
use crate::error::{Error, Result};
use crate::macros::{ArgValue, Definition, Macro};
use crate::processor::Processor;
use crate::token::{Token, TokenKind};
use crate::trace::DebugFlags;

impl Processor {
    /// Resolves `name` against the include path and processes the file
    /// to EOF.
    pub fn process_file(&mut self, name: &str) -> Result<()> {
        self.push_include(name)?;
        self.run()
    }

    /// Processes a bare string as the whole input.
    pub fn process_string(&mut self, text: &str) -> Result<()> {
        self.input.push_string(text);
        self.run()
    }

    /// Resolves an include name and pushes the file onto the input
    /// stack; the running token loop picks it up next.
    pub(crate) fn push_include(&mut self, name: &str) -> Result<()> {
        let path = self
            .config
            .search_file(name)
            .ok_or_else(|| Error::CannotOpen(name.to_string()))?;
        let content =
            fs::read_to_string(&path).map_err(|_| Error::CannotOpen(name.to_string()))?;
        self.tracer.report(
            DebugFlags::PATH,
            &format!("path search for `{}' found `{}'", name, path.display()),
        )?;
        let display = path
            .file_name()
            .map(|base| base.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        self.tracer
            .report(DebugFlags::INPUT, &format!("input read from {display}"))?;
        self.input.push_file(display, content);
        Ok(())
    }

    /// Drives the token loop to EOF. Deferred `m4wrap` text is re-fed
    /// one entry per EOF, so a wrap may wrap again; afterwards the
    /// remaining diversions are flushed in ascending order.
    fn run(&mut self) -> Result<()> {
        loop {
            let (token, line) = self.next_token()?;
            if token == Token::Eof {
                match self.take_wrap() {
                    Some(text) => {
                        self.input.push_string(text);
                        continue;
                    }
                    None => break,
                }
            }
            self.expand_token(token, line, None)?;
        }
        self.finish_diversions()?;
        self.flush()
    }

    pub(crate) fn finish_diversions(&mut self) -> Result<()> {
        self.diversions.make_diversion(0);
        self.undivert_all()
    }

    /// Expands one token. With `acc` set (argument collection mode) the
    /// shipped text is appended to the accumulator and returned instead
    /// of being emitted.
    pub(crate) fn expand_token(
        &mut self,
        token: Token,
        line: usize,
        acc: Option<String>,
    ) -> Result<Option<String>> {
        match token {
            Token::Eof | Token::Macdef(_) => Ok(acc),
            Token::String(text) => {
                if acc.is_none() {
                    self.note_comment(&text);
                }
                self.ship_or_append(text, line, acc)
            }
            Token::Word(word) => match self.find_for_invocation(&word) {
                Some(mac) => {
                    self.expand_macro(mac)?;
                    Ok(acc)
                }
                None => self.ship_or_append(word, line, acc),
            },
            Token::Open => self.ship_or_append("(".to_string(), line, acc),
            Token::Comma => self.ship_or_append(",".to_string(), line, acc),
            Token::Close => self.ship_or_append(")".to_string(), line, acc),
            Token::Simple(ch) => {
                if ch == '\n' && acc.is_none() {
                    self.pending_comments.clear();
                }
                self.ship_or_append(ch.to_string(), line, acc)
            }
        }
    }

    fn ship_or_append(
        &mut self,
        text: String,
        line: usize,
        acc: Option<String>,
    ) -> Result<Option<String>> {
        match acc {
            Some(mut buffer) => {
                buffer.push_str(&text);
                Ok(Some(buffer))
            }
            None => {
                self.shipout_text(&text, line)?;
                Ok(None)
            }
        }
    }

    /// Remembers comment spans so a following `define` can pick them up
    /// as documentation.
    fn note_comment(&mut self, text: &str) {
        let begin = &self.config.begin_comment;
        if !begin.is_empty() && text.starts_with(begin.as_str()) {
            let trimmed = text.trim_end_matches('\n').to_string();
            self.pending_comments.push(trimmed);
        }
    }

    /// Looks `name` up for invocation. A blind builtin requires an
    /// immediately following `(`; without one the identifier prints
    /// literally. This peek is the only token lookahead in the engine.
    pub(crate) fn find_for_invocation(&mut self, name: &str) -> Option<Macro> {
        let mac = self.macros.lookup(name)?.clone();
        let blind = match &mac.def {
            Definition::Builtin(id) => builtins::spec(*id).blind_no_args,
            Definition::Text(_) => false,
        };
        if blind && self.peek_token() != TokenKind::Open {
            return None;
        }
        Some(mac)
    }

    /// Runs one invocation: nesting guard, call id, tracing, argument
    /// collection, the call itself, and result pushback.
    pub(crate) fn expand_macro(&mut self, mac: Macro) -> Result<()> {
        self.expansion_level += 1;
        if self.expansion_level > self.config.nesting_limit {
            return Err(Error::NestingLimit(self.config.nesting_limit));
        }
        self.macro_call_id += 1;
        let call_id = self.macro_call_id;
        let level = self.expansion_level;
        let traced = mac.traced || self.tracer.flags.contains(DebugFlags::TRACE_ALL);

        if traced {
            self.tracer
                .trace_call(self.input.current_file(), level, call_id, &mac.name)?;
        }
        let args = self.collect_arguments(&mac.name)?;
        if traced {
            self.tracer.trace_pre(
                self.input.current_file(),
                level,
                call_id,
                &mac.name,
                &args,
                (self.config.left_quote.as_str(), self.config.right_quote.as_str()),
            )?;
        }
        let result = self.call_macro(&mac, &args)?;
        if traced {
            self.tracer.trace_post(
                self.input.current_file(),
                level,
                call_id,
                &mac.name,
                result.as_deref(),
                (self.config.left_quote.as_str(), self.config.right_quote.as_str()),
            )?;
        }
        if let Some(text) = result {
            if !text.is_empty() {
                self.input.push_string(text);
            }
        }
        self.expansion_level -= 1;
        Ok(())
    }

    /// Collects `name(...)` arguments; a word not followed by `(` is a
    /// zero-argument call. The name itself is always argument 0.
    pub(crate) fn collect_arguments(&mut self, name: &str) -> Result<Vec<ArgValue>> {
        let mut args = vec![ArgValue::Text(name.to_string())];
        if self.peek_token() != TokenKind::Open {
            return Ok(args);
        }
        self.next_token()?; // the `(`
        loop {
            let (more, arg) = self.expand_argument()?;
            args.push(arg);
            if !more {
                return Ok(args);
            }
        }
    }

    /// Accumulates one argument, tracking parenthesis nesting. Returns
    /// whether more arguments follow.
    fn expand_argument(&mut self) -> Result<(bool, ArgValue)> {
        // unquoted leading whitespace is skipped
        let (mut token, mut line) = loop {
            let (token, line) = self.next_token()?;
            match &token {
                Token::Simple(ch) if ch.is_whitespace() => continue,
                _ => break (token, line),
            }
        };

        let mut acc = ArgValue::Text(String::new());
        let mut depth = 0usize;
        loop {
            match token {
                Token::Comma if depth == 0 => return Ok((true, acc)),
                Token::Close if depth == 0 => return Ok((false, acc)),
                Token::Open => {
                    depth += 1;
                    acc = self.append_token(acc, Token::Open, line)?;
                }
                Token::Close => {
                    depth -= 1;
                    acc = self.append_token(acc, Token::Close, line)?;
                }
                Token::Eof => return Err(Error::EofInArguments),
                Token::Macdef(id) => {
                    // a builtin handle survives only as the entire argument
                    if matches!(&acc, ArgValue::Text(text) if text.is_empty()) {
                        acc = ArgValue::Builtin(id);
                    }
                }
                other => {
                    acc = self.append_token(acc, other, line)?;
                }
            }
            let (next, next_line) = self.next_token()?;
            token = next;
            line = next_line;
        }
    }

    fn append_token(&mut self, acc: ArgValue, token: Token, line: usize) -> Result<ArgValue> {
        let text = match acc {
            ArgValue::Text(text) => text,
            // text after a handle degrades the handle to nothing
            ArgValue::Builtin(_) => String::new(),
        };
        let out = self.expand_token(token, line, Some(text))?;
        Ok(ArgValue::Text(out.unwrap_or_default()))
    }

    /// Invokes a definition with the collected arguments.
    pub(crate) fn call_macro(&mut self, mac: &Macro, args: &[ArgValue]) -> Result<Option<String>> {
        match &mac.def {
            Definition::Builtin(id) => builtins::invoke(self, *id, &mac.name, args),
            Definition::Text(body) => Ok(Some(self.expand_user_macro(body, args))),
        }
    }

    /// Substitutes `$` references in a text template: `$0`..`$n` (longest
    /// digit run), `$#`, `$*`, `$@`; any other `$x` stays literal.
    pub(crate) fn expand_user_macro(&self, body: &str, args: &[ArgValue]) -> String {
        let chars: Vec<char> = body.chars().collect();
        let mut out = String::with_capacity(body.len());
        let mut i = 0;
        while i < chars.len() {
            if chars[i] != '$' || i + 1 == chars.len() {
                out.push(chars[i]);
                i += 1;
                continue;
            }
            match chars[i + 1] {
                digit if digit.is_ascii_digit() => {
                    let mut n = 0usize;
                    let mut j = i + 1;
                    while j < chars.len() && chars[j].is_ascii_digit() {
                        n = n
                            .saturating_mul(10)
                            .saturating_add(chars[j].to_digit(10).unwrap() as usize);
                        j += 1;
                    }
                    if let Some(arg) = args.get(n) {
                        out.push_str(arg.as_text());
                    }
                    i = j;
                }
                '#' => {
                    out.push_str(&(args.len() - 1).to_string());
                    i += 2;
                }
                '*' => {
                    out.push_str(&self.dump_args(args, false, ","));
                    i += 2;
                }
                '@' => {
                    out.push_str(&self.dump_args(args, true, ","));
                    i += 2;
                }
                _ => {
                    out.push('$');
                    i += 1;
                }
            }
        }
        out
    }

    /// Joins arguments 1…, optionally re-quoting each with the current
    /// delimiters. Builtin handles read as empty text.
    pub(crate) fn dump_args(&self, args: &[ArgValue], quoted: bool, separator: &str) -> String {
        args[1..]
            .iter()
            .map(|arg| {
                if quoted {
                    self.quote(arg.as_text())
                } else {
                    arg.as_text().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(separator)
    }
}
