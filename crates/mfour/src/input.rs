//! The layered input stack.
//!
//! Input comes from files, from strings pushed back by macro expansion,
//! and from one-shot builtin handles produced by `defn`. The stack
//! exposes a single character stream; reads transparently skip exhausted
//! sources. String re-push is also the pushback primitive the tokenizer
//! uses when a multi-character delimiter fails to match.

use crate::builtins::BuiltinId;

/// Result of peeking at or consuming one position of the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peeked {
    Char(char),
    /// The next "character" is a builtin handle pushed by `defn`.
    Macro,
    Eof,
}

/// One layered character source.
#[derive(Debug)]
pub enum InputSource {
    /// A file from the command line or `include`. Only file sources track
    /// line numbers; the first line of a file reads as line 1.
    File {
        name: String,
        content: String,
        offset: usize,
        line: usize,
        at_line_start: bool,
    },
    /// A string resulting from macro expansion or pushback. Its logical
    /// file and line are inherited from the enclosing file source.
    Text { content: String, offset: usize },
    /// A one-shot marker carrying a builtin handle.
    Macro(BuiltinId),
}

impl InputSource {
    fn peek(&self) -> Option<char> {
        match self {
            InputSource::File {
                content, offset, ..
            }
            | InputSource::Text { content, offset } => content[*offset..].chars().next(),
            InputSource::Macro(_) => None,
        }
    }

    fn advance(&mut self) -> Option<char> {
        match self {
            InputSource::File {
                content,
                offset,
                line,
                at_line_start,
                ..
            } => {
                let ch = content[*offset..].chars().next()?;
                if *at_line_start {
                    *line += 1;
                    *at_line_start = false;
                }
                if ch == '\n' {
                    *at_line_start = true;
                }
                *offset += ch.len_utf8();
                Some(ch)
            }
            InputSource::Text { content, offset } => {
                let ch = content[*offset..].chars().next()?;
                *offset += ch.len_utf8();
                Some(ch)
            }
            InputSource::Macro(_) => None,
        }
    }
}

/// Ordered sequence of character sources; the top of the stack is
/// consumed first.
#[derive(Debug, Default)]
pub struct InputStack {
    stack: Vec<InputSource>,
}

impl InputStack {
    pub fn new() -> Self {
        InputStack { stack: Vec::new() }
    }

    pub fn push_file(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.stack.push(InputSource::File {
            name: name.into(),
            content: content.into(),
            offset: 0,
            line: 0,
            at_line_start: true,
        });
    }

    pub fn push_string(&mut self, text: impl Into<String>) {
        let content = text.into();
        if !content.is_empty() {
            self.stack.push(InputSource::Text { content, offset: 0 });
        }
    }

    pub fn push_macro(&mut self, id: BuiltinId) {
        self.stack.push(InputSource::Macro(id));
    }

    /// The next character without consuming it; exhausted sources are
    /// popped on the way.
    pub fn peek_char(&mut self) -> Peeked {
        while let Some(top) = self.stack.last() {
            if matches!(top, InputSource::Macro(_)) {
                return Peeked::Macro;
            }
            match top.peek() {
                Some(ch) => return Peeked::Char(ch),
                None => {
                    self.stack.pop();
                }
            }
        }
        Peeked::Eof
    }

    /// Consumes one character. A macro source is popped and reported as
    /// [`Peeked::Macro`]; use [`InputStack::take_macro`] to keep its id.
    pub fn next_char(&mut self) -> Peeked {
        loop {
            match self.peek_char() {
                Peeked::Eof => return Peeked::Eof,
                Peeked::Macro => {
                    self.stack.pop();
                    return Peeked::Macro;
                }
                Peeked::Char(_) => {
                    if let Some(ch) = self.stack.last_mut().and_then(InputSource::advance) {
                        return Peeked::Char(ch);
                    }
                }
            }
        }
    }

    /// Consumes a pending macro handle; `None` when the head of the
    /// stream is not a macro source.
    pub fn take_macro(&mut self) -> Option<BuiltinId> {
        match self.peek_char() {
            Peeked::Macro => match self.stack.pop() {
                Some(InputSource::Macro(id)) => Some(id),
                _ => None,
            },
            _ => None,
        }
    }

    /// The nearest file source on the stack, as `(name, line)`.
    pub fn current_file(&self) -> Option<(&str, usize)> {
        self.stack.iter().rev().find_map(|source| match source {
            InputSource::File { name, line, .. } => Some((name.as_str(), *line)),
            _ => None,
        })
    }

    /// Attempts to match `pattern` literally at the head of the stream.
    ///
    /// On a failed match any consumed characters are pushed back; on a
    /// successful match with `consume == false` the matched characters
    /// are pushed back too, so subsequent peeks see them again. The empty
    /// pattern never matches.
    pub fn match_literal(&mut self, pattern: &str, consume: bool) -> bool {
        if pattern.is_empty() {
            return false;
        }
        let mut read = String::new();
        for expected in pattern.chars() {
            match self.peek_char() {
                Peeked::Char(ch) if ch == expected => {
                    self.next_char();
                    read.push(ch);
                }
                _ => {
                    self.push_string(read);
                    return false;
                }
            }
        }
        if !consume {
            self.push_string(read);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(stack: &mut InputStack) -> String {
        let mut out = String::new();
        while let Peeked::Char(ch) = stack.next_char() {
            out.push(ch);
        }
        out
    }

    #[test]
    fn top_of_stack_is_consumed_first() {
        let mut stack = InputStack::new();
        stack.push_string("later");
        stack.push_string("first ");
        assert_eq!(drain(&mut stack), "first later");
    }

    #[test]
    fn exhausted_sources_are_skipped_transparently() {
        let mut stack = InputStack::new();
        stack.push_string("b");
        stack.push_string("a");
        assert_eq!(stack.next_char(), Peeked::Char('a'));
        assert_eq!(stack.peek_char(), Peeked::Char('b'));
        assert_eq!(stack.next_char(), Peeked::Char('b'));
        assert_eq!(stack.next_char(), Peeked::Eof);
    }

    #[test]
    fn empty_stack_reports_eof() {
        let mut stack = InputStack::new();
        assert_eq!(stack.peek_char(), Peeked::Eof);
        assert_eq!(stack.next_char(), Peeked::Eof);
    }

    #[test]
    fn file_lines_start_at_one() {
        let mut stack = InputStack::new();
        stack.push_file("a.m4", "x\ny");
        assert_eq!(stack.current_file(), Some(("a.m4", 0)));
        stack.next_char();
        assert_eq!(stack.current_file(), Some(("a.m4", 1)));
        stack.next_char(); // the newline still belongs to line 1
        assert_eq!(stack.current_file(), Some(("a.m4", 1)));
        stack.next_char();
        assert_eq!(stack.current_file(), Some(("a.m4", 2)));
    }

    #[test]
    fn string_sources_inherit_the_enclosing_file() {
        let mut stack = InputStack::new();
        stack.push_file("a.m4", "rest");
        stack.push_string("expansion");
        assert_eq!(stack.current_file(), Some(("a.m4", 0)));
    }

    #[test]
    fn match_literal_consumes_on_success() {
        let mut stack = InputStack::new();
        stack.push_string("`quoted");
        assert!(stack.match_literal("`", true));
        assert_eq!(stack.peek_char(), Peeked::Char('q'));
    }

    #[test]
    fn match_literal_restores_on_peek() {
        let mut stack = InputStack::new();
        stack.push_string("[[x");
        assert!(stack.match_literal("[[", false));
        assert_eq!(drain(&mut stack), "[[x");
    }

    #[test]
    fn failed_match_pushes_partial_read_back() {
        let mut stack = InputStack::new();
        stack.push_string("[!x");
        assert!(!stack.match_literal("[[", true));
        assert_eq!(drain(&mut stack), "[!x");
    }

    #[test]
    fn empty_pattern_never_matches() {
        let mut stack = InputStack::new();
        stack.push_string("abc");
        assert!(!stack.match_literal("", true));
        assert_eq!(stack.peek_char(), Peeked::Char('a'));
    }

    #[test]
    fn macro_sources_are_one_shot() {
        let mut stack = InputStack::new();
        stack.push_string("after");
        stack.push_macro(BuiltinId(3));
        assert_eq!(stack.peek_char(), Peeked::Macro);
        assert_eq!(stack.take_macro(), Some(BuiltinId(3)));
        assert_eq!(stack.peek_char(), Peeked::Char('a'));
    }
}
