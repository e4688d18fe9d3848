//! String and arithmetic builtins: `len`, `index`, `substr`, `translit`,
//! `format`, `patsubst`, `regexp`, `shift`, `incr`, `decr`, `eval`.

use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::builtins::{non_empty, parse_number};
use crate::error::{Error, Result};
use crate::eval;
use crate::macros::ArgValue;
use crate::processor::Processor;

pub(super) fn len(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    Ok(Some(args[1].as_text().chars().count().to_string()))
}

/// Offset of the first occurrence of `needle` in `haystack`, or -1.
pub(super) fn index(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let needle = args[1].as_text();
    let haystack = args[2].as_text();
    let offset = match haystack.find(needle) {
        Some(byte_offset) => haystack[..byte_offset].chars().count() as i64,
        None => -1,
    };
    Ok(Some(offset.to_string()))
}

pub(super) fn substr(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    if args.len() == 2 {
        return Ok(non_empty(args[1].as_text()));
    }
    let chars: Vec<char> = args[1].as_text().chars().collect();
    let start = parse_number(args[2].as_text())?;
    if start < 0 || start as usize >= chars.len() {
        return Ok(None);
    }
    let start = start as usize;
    let end = match args.get(3) {
        Some(length) => {
            let length = parse_number(length.as_text())?;
            if length <= 0 {
                return Ok(None);
            }
            (start + length as usize).min(chars.len())
        }
        None => chars.len(),
    };
    Ok(non_empty(&chars[start..end].iter().collect::<String>()))
}

pub(super) fn incr(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    Ok(Some(parse_number(args[1].as_text())?.wrapping_add(1).to_string()))
}

pub(super) fn decr(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    Ok(Some(parse_number(args[1].as_text())?.wrapping_sub(1).to_string()))
}

/// Arguments 2 and on, each re-quoted, comma-joined.
pub(super) fn shift(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    Ok(non_empty(&processor.dump_args(&args[1..], true, ",")))
}

pub(super) fn eval_builtin(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let radix = match args.get(2).map(ArgValue::as_text).filter(|s| !s.is_empty()) {
        Some(text) => parse_number(text)?,
        None => 10,
    };
    if radix != 10 {
        return Err(Error::BadRadix(radix));
    }
    let width = match args.get(3).map(ArgValue::as_text).filter(|s| !s.is_empty()) {
        Some(text) => parse_number(text)?.max(1) as usize,
        None => 1,
    };
    let value = eval::eval(args[1].as_text())?;
    Ok(Some(eval::format_result(value, width)))
}

/// Expands `a-z` style ranges, forward or reverse, in a `translit`
/// character set. A leading or trailing dash is literal.
fn expand_ranges(set: &str) -> String {
    let chars: Vec<char> = set.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len() && chars[i + 1] == '-' {
            let (from, to) = (chars[i], chars[i + 2]);
            if from <= to {
                for ch in from..=to {
                    out.push(ch);
                }
            } else {
                for ch in (to..=from).rev() {
                    out.push(ch);
                }
            }
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Character-by-character translation; characters of `from` with no
/// counterpart in `to` are deleted, first occurrence wins.
pub(super) fn translit(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    if args.len() <= 2 {
        return Ok(non_empty(args[1].as_text()));
    }
    let data = args[1].as_text();
    let from: Vec<char> = expand_ranges(args[2].as_text()).chars().collect();
    let to: Vec<char> = expand_ranges(args.get(3).map(ArgValue::as_text).unwrap_or(""))
        .chars()
        .collect();

    let mut table: HashMap<char, Option<char>> = HashMap::new();
    for (i, ch) in from.iter().enumerate() {
        table.entry(*ch).or_insert_with(|| to.get(i).copied());
    }

    let mut out = String::with_capacity(data.len());
    for ch in data.chars() {
        match table.get(&ch) {
            Some(Some(replacement)) => out.push(*replacement),
            Some(None) => {}
            None => out.push(ch),
        }
    }
    Ok(non_empty(&out))
}

/// Emulates BRE-style group syntax: `\(` `\)` `\{` `\}` become the bare
/// metacharacters before the pattern is compiled.
fn normalize_pattern(pattern: &str) -> String {
    pattern
        .replace(r"\(", "(")
        .replace(r"\)", ")")
        .replace(r"\{", "{")
        .replace(r"\}", "}")
}

/// Replacement-text substitution: `&` and `\0` are the whole match,
/// `\1`..`\9` the groups, `\&` a literal ampersand, `\\` a backslash.
fn substitute(replacement: &str, caps: &Captures) -> String {
    let chars: Vec<char> = replacement.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '&' => {
                out.push_str(caps.get(0).map(|m| m.as_str()).unwrap_or(""));
                i += 1;
            }
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                if let Some(group) = next.to_digit(10) {
                    if let Some(m) = caps.get(group as usize) {
                        out.push_str(m.as_str());
                    }
                    i += 2;
                } else if next == '&' {
                    out.push('&');
                    i += 2;
                } else if next == '\\' {
                    out.push('\\');
                    i += 2;
                } else {
                    out.push('\\');
                    i += 1;
                }
            }
            ch => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

/// Global regex substitution.
pub(super) fn patsubst(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    if args.len() == 2 {
        return Ok(non_empty(args[1].as_text()));
    }
    let text = args[1].as_text();
    let pattern = Regex::new(&normalize_pattern(args[2].as_text()))?;
    let replacement = args.get(3).map(ArgValue::as_text).unwrap_or("");

    let mut out = String::new();
    let mut last = 0usize;
    for caps in pattern.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always exists");
        out.push_str(&text[last..whole.start()]);
        out.push_str(&substitute(replacement, &caps));
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(non_empty(&out))
}

/// First-match offset, or the substituted replacement when one is given.
pub(super) fn regexp(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    if args.len() == 2 {
        return Ok(Some("0".to_string()));
    }
    let text = args[1].as_text();
    let pattern = Regex::new(&normalize_pattern(args[2].as_text()))?;
    match args.get(3) {
        None => {
            let offset = match pattern.find(text) {
                Some(m) => text[..m.start()].chars().count() as i64,
                None => -1,
            };
            Ok(Some(offset.to_string()))
        }
        Some(replacement) => match pattern.captures(text) {
            Some(caps) => Ok(non_empty(&substitute(replacement.as_text(), &caps))),
            None => Ok(None),
        },
    }
}

#[derive(Default)]
struct FormatSpec {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
}

fn to_int(text: &str) -> Result<i64> {
    parse_number(text)
}

fn to_float(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::BadNumber(text.to_string()))
}

fn pad(body: String, width: usize, spec: &FormatSpec) -> String {
    let len = body.chars().count();
    if len >= width {
        return body;
    }
    if spec.left {
        format!("{body:<width$}")
    } else if spec.zero {
        let (sign, rest) = match body.chars().next() {
            Some(ch @ ('+' | '-' | ' ')) => (ch.to_string(), body[ch.len_utf8()..].to_string()),
            _ => (String::new(), body),
        };
        let digits = width - sign.chars().count();
        format!("{sign}{rest:0>digits$}")
    } else {
        format!("{body:>width$}")
    }
}

fn sci(value: f64, precision: usize, upper: bool) -> String {
    let formatted = format!("{value:.precision$e}");
    let out = match formatted.find('e') {
        Some(pos) => {
            let (mantissa, exponent) = formatted.split_at(pos);
            let exponent: i32 = exponent[1..].parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => formatted,
    };
    if upper {
        out.to_uppercase()
    } else {
        out
    }
}

fn signed(value: String, negative: bool, spec: &FormatSpec) -> String {
    let sign = if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };
    format!("{sign}{value}")
}

fn format_one(
    conversion: char,
    spec: &FormatSpec,
    width: usize,
    precision: Option<usize>,
    arg: &str,
) -> Result<String> {
    let body = match conversion {
        'd' | 'i' | 'u' => {
            let value = to_int(arg)?;
            let mut digits = value.unsigned_abs().to_string();
            if let Some(p) = precision {
                digits = format!("{digits:0>p$}");
            }
            signed(digits, value < 0, spec)
        }
        'o' => {
            let value = to_int(arg)? as u64;
            let digits = format!("{value:o}");
            if spec.alt {
                format!("0{digits}")
            } else {
                digits
            }
        }
        'x' | 'X' => {
            let value = to_int(arg)? as u64;
            let digits = if conversion == 'x' {
                format!("{value:x}")
            } else {
                format!("{value:X}")
            };
            if spec.alt {
                let prefix = if conversion == 'x' { "0x" } else { "0X" };
                format!("{prefix}{digits}")
            } else {
                digits
            }
        }
        'c' => {
            let value = to_int(arg)?;
            char::from_u32(value as u32)
                .map(String::from)
                .unwrap_or_default()
        }
        's' => {
            let mut text = arg.to_string();
            if let Some(p) = precision {
                text = text.chars().take(p).collect();
            }
            text
        }
        'f' | 'F' => {
            let value = to_float(arg)?;
            let rendered = format!("{:.*}", precision.unwrap_or(6), value.abs());
            signed(rendered, value.is_sign_negative(), spec)
        }
        'e' | 'E' => {
            let value = to_float(arg)?;
            let rendered = sci(value.abs(), precision.unwrap_or(6), conversion == 'E');
            signed(rendered, value.is_sign_negative(), spec)
        }
        // hex-float formatting has no stdlib support; the coercion
        // contract is kept and the value renders in scientific form
        'a' | 'A' => {
            let value = to_float(arg)?;
            let rendered = sci(value.abs(), precision.unwrap_or(6), conversion == 'A');
            signed(rendered, value.is_sign_negative(), spec)
        }
        'g' | 'G' => {
            let value = to_float(arg)?;
            let rendered = format!("{}", value.abs());
            let rendered = if conversion == 'G' {
                rendered.to_uppercase()
            } else {
                rendered
            };
            signed(rendered, value.is_sign_negative(), spec)
        }
        other => return Err(Error::Format(format!("unknown conversion `%{other}`"))),
    };
    Ok(pad(body, width, spec))
}

/// `printf`-style formatting: `%d %i %o %x %X %u %c` coerce to integer,
/// `%e %E %f %g %G %a %A` to float, `%s` passes through.
pub(super) fn format(_processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let template = args[1].as_text();
    let values: Vec<&str> = args[2..].iter().map(ArgValue::as_text).collect();

    let chars: Vec<char> = template.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    let mut next_value = 0usize;
    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;
        if chars.get(i) == Some(&'%') {
            out.push('%');
            i += 1;
            continue;
        }
        let mut spec = FormatSpec::default();
        while let Some(flag) = chars.get(i) {
            match flag {
                '-' => spec.left = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.alt = true,
                _ => break,
            }
            i += 1;
        }
        let mut width = 0usize;
        while let Some(digit) = chars.get(i).and_then(|ch| ch.to_digit(10)) {
            width = width * 10 + digit as usize;
            i += 1;
        }
        let mut precision = None;
        if chars.get(i) == Some(&'.') {
            i += 1;
            let mut value = 0usize;
            while let Some(digit) = chars.get(i).and_then(|ch| ch.to_digit(10)) {
                value = value * 10 + digit as usize;
                i += 1;
            }
            precision = Some(value);
        }
        let conversion = *chars
            .get(i)
            .ok_or_else(|| Error::Format("truncated conversion".to_string()))?;
        i += 1;
        let arg = values.get(next_value).copied().unwrap_or("");
        next_value += 1;
        out.push_str(&format_one(conversion, &spec, width, precision, arg)?);
    }
    Ok(non_empty(&out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_expand_forward_and_reverse() {
        assert_eq!(expand_ranges("a-e"), "abcde");
        assert_eq!(expand_ranges("e-a"), "edcba");
        assert_eq!(expand_ranges("a-c0-2"), "abc012");
        assert_eq!(expand_ranges("a-"), "a-");
        assert_eq!(expand_ranges("-z"), "-z");
        assert_eq!(expand_ranges("plain"), "plain");
    }

    #[test]
    fn normalize_turns_escaped_groups_into_real_ones() {
        assert_eq!(normalize_pattern(r"\(a\)\{b\}"), "(a){b}");
    }

    #[test]
    fn substitute_handles_backreferences() {
        let re = Regex::new("(a+)(b+)").unwrap();
        let caps = re.captures("xxaabbyy").unwrap();
        assert_eq!(substitute(r"<\1|\2>", &caps), "<aa|bb>");
        assert_eq!(substitute("&", &caps), "aabb");
        assert_eq!(substitute(r"\0", &caps), "aabb");
        assert_eq!(substitute(r"\&", &caps), "&");
        assert_eq!(substitute(r"\\", &caps), "\\");
        assert_eq!(substitute(r"\q", &caps), "\\q");
    }

    #[test]
    fn format_one_integers() {
        let spec = FormatSpec::default();
        assert_eq!(format_one('d', &spec, 0, None, "42").unwrap(), "42");
        assert_eq!(format_one('d', &spec, 5, None, "-3").unwrap(), "   -3");
        assert_eq!(format_one('x', &spec, 0, None, "255").unwrap(), "ff");
        assert_eq!(format_one('X', &spec, 0, None, "255").unwrap(), "FF");
        assert_eq!(format_one('o', &spec, 0, None, "8").unwrap(), "10");
        assert_eq!(format_one('c', &spec, 0, None, "65").unwrap(), "A");
    }

    #[test]
    fn format_one_zero_pad_keeps_the_sign_first() {
        let spec = FormatSpec {
            zero: true,
            ..FormatSpec::default()
        };
        assert_eq!(format_one('d', &spec, 5, None, "-3").unwrap(), "-0003");
    }

    #[test]
    fn format_one_floats() {
        let spec = FormatSpec::default();
        assert_eq!(format_one('f', &spec, 0, Some(2), "3.14159").unwrap(), "3.14");
        assert_eq!(format_one('f', &spec, 0, None, "1.5").unwrap(), "1.500000");
        assert_eq!(
            format_one('e', &spec, 0, Some(2), "150").unwrap(),
            "1.50e+02"
        );
    }
}
