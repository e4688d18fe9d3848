//! Output-routing and delimiter builtins: `divert`, `divnum`,
//! `undivert`, `dnl`, `changequote`, `changecom`.

use crate::builtins::parse_number;
use crate::config::{
    DEFAULT_BEGIN_COMMENT, DEFAULT_END_COMMENT, DEFAULT_LEFT_QUOTE, DEFAULT_RIGHT_QUOTE,
};
use crate::error::Result;
use crate::macros::ArgValue;
use crate::processor::Processor;

/// Switches the current diversion; no argument (or an empty one) means
/// the real output, negative ids discard.
pub(super) fn divert(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let id = match args.get(1).map(ArgValue::as_text).filter(|s| !s.is_empty()) {
        Some(text) => parse_number(text)? as i32,
        None => 0,
    };
    processor.diversions.make_diversion(id);
    Ok(None)
}

pub(super) fn divnum(processor: &mut Processor, _args: &[ArgValue]) -> Result<Option<String>> {
    Ok(Some(processor.diversions.current().to_string()))
}

/// With arguments, flushes the named diversions in the order given;
/// without, flushes everything except the current one in id order.
pub(super) fn undivert(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    if args.len() == 1 {
        processor.undivert_all()?;
    } else {
        for arg in &args[1..] {
            let id = parse_number(arg.as_text())? as i32;
            processor.undivert_one(id)?;
        }
    }
    Ok(None)
}

/// Discards input through the next newline.
pub(super) fn dnl(processor: &mut Processor, _args: &[ArgValue]) -> Result<Option<String>> {
    processor.skip_line();
    Ok(None)
}

/// No arguments restores the default quotes; one argument sets the left
/// quote only.
pub(super) fn changequote(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    match args.len() {
        1 => {
            processor.config.left_quote = DEFAULT_LEFT_QUOTE.to_string();
            processor.config.right_quote = DEFAULT_RIGHT_QUOTE.to_string();
        }
        2 => {
            processor.config.left_quote = args[1].as_text().to_string();
        }
        _ => {
            processor.config.left_quote = args[1].as_text().to_string();
            processor.config.right_quote = args[2].as_text().to_string();
        }
    }
    Ok(None)
}

/// Same shape as `changequote`, for the comment delimiters.
pub(super) fn changecom(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    match args.len() {
        1 => {
            processor.config.begin_comment = DEFAULT_BEGIN_COMMENT.to_string();
            processor.config.end_comment = DEFAULT_END_COMMENT.to_string();
        }
        2 => {
            processor.config.begin_comment = args[1].as_text().to_string();
        }
        _ => {
            processor.config.begin_comment = args[1].as_text().to_string();
            processor.config.end_comment = args[2].as_text().to_string();
        }
    }
    Ok(None)
}
