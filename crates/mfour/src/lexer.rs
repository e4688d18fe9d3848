//! The context-sensitive tokenizer.
//!
//! One token per [`Processor::next_token`] call, with one-token kind
//! lookahead through [`Processor::peek_token`]. The quote and comment
//! delimiters come from the live configuration, so `changequote` and
//! `changecom` take effect for the very next token. Pushback for failed
//! multi-character delimiter matches is handled by the input stack, not
//! here.

use crate::error::{Error, Result};
use crate::input::Peeked;
use crate::processor::Processor;
use crate::token::{Token, TokenKind};

fn is_word_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_word_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

impl Processor {
    /// Reads the next token, consuming its characters. Also returns the
    /// line of the nearest enclosing file source.
    pub(crate) fn next_token(&mut self) -> Result<(Token, usize)> {
        let line = self.current_line();
        match self.input.peek_char() {
            Peeked::Eof => Ok((Token::Eof, line)),
            Peeked::Macro => {
                let id = self
                    .input
                    .take_macro()
                    .ok_or(Error::Internal("macro source vanished under the tokenizer"))?;
                Ok((Token::Macdef(id), line))
            }
            Peeked::Char(ch) => {
                if self.input.match_literal(&self.config.begin_comment, true) {
                    return self.read_comment(line);
                }
                if is_word_start(ch) {
                    return Ok((self.read_word(), line));
                }
                if self.input.match_literal(&self.config.left_quote, true) {
                    return self.read_quoted(line);
                }
                self.input.next_char();
                let token = match ch {
                    '(' => Token::Open,
                    ',' => Token::Comma,
                    ')' => Token::Close,
                    other => Token::Simple(other),
                };
                Ok((token, line))
            }
        }
    }

    /// Recognizes the next token's kind without consuming input.
    pub(crate) fn peek_token(&mut self) -> TokenKind {
        match self.input.peek_char() {
            Peeked::Eof => TokenKind::Eof,
            Peeked::Macro => TokenKind::Macdef,
            Peeked::Char(ch) => {
                if self.input.match_literal(&self.config.begin_comment, false) {
                    TokenKind::String
                } else if is_word_start(ch) {
                    TokenKind::Word
                } else if self.input.match_literal(&self.config.left_quote, false) {
                    TokenKind::String
                } else {
                    match ch {
                        '(' => TokenKind::Open,
                        ',' => TokenKind::Comma,
                        ')' => TokenKind::Close,
                        _ => TokenKind::Simple,
                    }
                }
            }
        }
    }

    /// Consumes input through the next newline (`dnl`); EOF is treated
    /// as the newline, with a warning.
    pub(crate) fn skip_line(&mut self) {
        loop {
            match self.input.next_char() {
                Peeked::Char('\n') => return,
                Peeked::Eof => {
                    self.warn("end of file treated as newline");
                    return;
                }
                _ => {}
            }
        }
    }

    fn current_line(&self) -> usize {
        self.input.current_file().map(|(_, line)| line).unwrap_or(0)
    }

    fn file_position(&self) -> (String, usize) {
        match self.input.current_file() {
            Some((name, line)) => (name.to_string(), line),
            None => ("<input>".to_string(), 0),
        }
    }

    /// Reads a comment span; the whole span, delimiters included, ships
    /// through as a STRING token.
    fn read_comment(&mut self, line: usize) -> Result<(Token, usize)> {
        let mut text = self.config.begin_comment.clone();
        loop {
            if self.input.match_literal(&self.config.end_comment, true) {
                text.push_str(&self.config.end_comment);
                return Ok((Token::String(text), line));
            }
            match self.input.next_char() {
                Peeked::Char(ch) => text.push(ch),
                Peeked::Macro => continue,
                Peeked::Eof => {
                    let (file, line) = self.file_position();
                    return Err(Error::UnterminatedComment { file, line });
                }
            }
        }
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        while let Peeked::Char(ch) = self.input.peek_char() {
            if !is_word_continue(ch) {
                break;
            }
            self.input.next_char();
            word.push(ch);
        }
        Token::Word(word)
    }

    /// Reads a quoted string with nesting: each left quote deepens, each
    /// right quote shallows; the outermost pair is stripped, inner ones
    /// are kept literally.
    fn read_quoted(&mut self, line: usize) -> Result<(Token, usize)> {
        let mut text = String::new();
        let mut depth = 1usize;
        loop {
            if self.input.match_literal(&self.config.right_quote, true) {
                depth -= 1;
                if depth == 0 {
                    return Ok((Token::String(text), line));
                }
                text.push_str(&self.config.right_quote);
            } else if self.input.match_literal(&self.config.left_quote, true) {
                depth += 1;
                text.push_str(&self.config.left_quote);
            } else {
                match self.input.next_char() {
                    Peeked::Char(ch) => text.push(ch),
                    Peeked::Macro => continue,
                    Peeked::Eof => {
                        let (file, line) = self.file_position();
                        return Err(Error::UnterminatedString { file, line });
                    }
                }
            }
        }
    }
}
