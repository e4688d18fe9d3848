//! Trace-control builtins: `traceon`, `traceoff`, `debugmode`,
//! `debugfile`.

use std::path::Path;

use crate::error::Result;
use crate::macros::ArgValue;
use crate::processor::Processor;
use crate::trace::DebugFlags;

/// Without names, toggles the global trace-all flag; with names, marks
/// the individual macros.
fn set_trace(processor: &mut Processor, args: &[ArgValue], on: bool) -> Result<Option<String>> {
    if args.len() == 1 {
        let flags = processor.debug_flags();
        processor.set_debug_flags(if on {
            flags.with(DebugFlags::TRACE_ALL)
        } else {
            flags.without(DebugFlags::TRACE_ALL)
        });
    } else {
        for arg in &args[1..] {
            let name = arg.as_text().to_string();
            if !processor.macros.set_traced(&name, on) {
                processor.warn(format!("undefined macro `{name}'"));
            }
        }
    }
    Ok(None)
}

pub(super) fn traceon(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    set_trace(processor, args, true)
}

pub(super) fn traceoff(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    set_trace(processor, args, false)
}

/// Replaces the trace verbosity; no argument restores the default set.
pub(super) fn debugmode(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let flags = match args.get(1) {
        Some(arg) => DebugFlags::parse(arg.as_text())?,
        None => DebugFlags::DEFAULT,
    };
    processor.set_debug_flags(flags);
    Ok(None)
}

/// Redirects the sideband; no argument (or an empty one) restores
/// stderr.
pub(super) fn debugfile(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    match args.get(1).map(ArgValue::as_text).filter(|s| !s.is_empty()) {
        Some(path) => {
            let path = path.to_string();
            processor.set_trace_file(Some(Path::new(&path)))?;
        }
        None => processor.set_trace_file(None)?,
    }
    Ok(None)
}
