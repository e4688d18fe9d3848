//! Integer expression evaluation for the `eval` builtin.
//!
//! A small recursive-descent parser over `||`, `&&`, the comparisons,
//! `+ - * / %`, unary `! - +` and parentheses. Values are `i64` with
//! C-style wrapping; boolean results are 1 or 0.

use crate::error::{Error, Result};

/// Evaluates an integer expression.
pub fn eval(expr: &str) -> Result<i64> {
    let mut parser = Parser {
        bytes: expr.as_bytes(),
        pos: 0,
        expr,
    };
    let value = parser.or_expr()?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(value)
}

/// Formats an eval result in decimal, zero-padded to `width` digits
/// after the sign.
pub fn format_result(value: i64, width: usize) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs().to_string();
    format!("{sign}{magnitude:0>width$}")
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    expr: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &str) -> Error {
        Error::Eval {
            expr: self.expr.to_string(),
            reason: reason.to_string(),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.bytes[self.pos..].starts_with(token.as_bytes()) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<i64> {
        let mut left = self.and_expr()?;
        while self.eat("||") {
            let right = self.and_expr()?;
            left = ((left != 0) || (right != 0)) as i64;
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<i64> {
        let mut left = self.cmp_expr()?;
        while self.eat("&&") {
            let right = self.cmp_expr()?;
            left = ((left != 0) && (right != 0)) as i64;
        }
        Ok(left)
    }

    fn cmp_expr(&mut self) -> Result<i64> {
        let mut left = self.add_expr()?;
        loop {
            if self.eat("==") {
                let right = self.add_expr()?;
                left = (left == right) as i64;
            } else if self.eat("!=") {
                let right = self.add_expr()?;
                left = (left != right) as i64;
            } else if self.eat("<=") {
                let right = self.add_expr()?;
                left = (left <= right) as i64;
            } else if self.eat(">=") {
                let right = self.add_expr()?;
                left = (left >= right) as i64;
            } else if self.eat("<") {
                let right = self.add_expr()?;
                left = (left < right) as i64;
            } else if self.eat(">") {
                let right = self.add_expr()?;
                left = (left > right) as i64;
            } else {
                return Ok(left);
            }
        }
    }

    fn add_expr(&mut self) -> Result<i64> {
        let mut left = self.mul_expr()?;
        loop {
            if self.eat("+") {
                left = left.wrapping_add(self.mul_expr()?);
            } else if self.eat("-") {
                left = left.wrapping_sub(self.mul_expr()?);
            } else {
                return Ok(left);
            }
        }
    }

    fn mul_expr(&mut self) -> Result<i64> {
        let mut left = self.unary()?;
        loop {
            if self.eat("*") {
                left = left.wrapping_mul(self.unary()?);
            } else if self.eat("/") {
                let right = self.unary()?;
                if right == 0 {
                    return Err(self.error("division by zero"));
                }
                left = left.wrapping_div(right);
            } else if self.eat("%") {
                let right = self.unary()?;
                if right == 0 {
                    return Err(self.error("modulo by zero"));
                }
                left = left.wrapping_rem(right);
            } else {
                return Ok(left);
            }
        }
    }

    fn unary(&mut self) -> Result<i64> {
        self.skip_ws();
        // `!=` never starts an operand, so a lone `!` here is negation
        if self.bytes.get(self.pos) == Some(&b'!') && self.bytes.get(self.pos + 1) != Some(&b'=') {
            self.pos += 1;
            return Ok((self.unary()? == 0) as i64);
        }
        if self.eat("-") {
            return Ok(self.unary()?.wrapping_neg());
        }
        if self.eat("+") {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<i64> {
        self.skip_ws();
        if self.eat("(") {
            let value = self.or_expr()?;
            if !self.eat(")") {
                return Err(self.error("expected `)`"));
            }
            return Ok(value);
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a number"));
        }
        self.expr[start..self.pos]
            .parse::<i64>()
            .map_err(|_| self.error("number out of range"))
    }
}
