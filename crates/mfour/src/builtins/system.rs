//! Environment-facing builtins: `include`, `sinclude`, `syscmd`,
//! `esyscmd`, `sysval`, `maketemp`, `mkstemp`, `m4exit`, `m4wrap`,
//! `errprint`, `__file__`, `__line__`, `__program__`.

use std::path::Path;

use mfour_shell::{run_shell, CaptureMode};

use crate::builtins::{non_empty, parse_number};
use crate::error::{Error, Result};
use crate::macros::ArgValue;
use crate::processor::Processor;

pub(super) fn file(processor: &mut Processor, _args: &[ArgValue]) -> Result<Option<String>> {
    let name = processor
        .current_file()
        .map(|(name, _)| name.to_string())
        .unwrap_or_default();
    Ok(Some(processor.quote(&name)))
}

pub(super) fn line(processor: &mut Processor, _args: &[ArgValue]) -> Result<Option<String>> {
    let line = processor.current_file().map(|(_, line)| line).unwrap_or(0);
    Ok(Some(processor.quote(&line.to_string())))
}

pub(super) fn program(processor: &mut Processor, _args: &[ArgValue]) -> Result<Option<String>> {
    let name = processor.config.program_name.clone();
    Ok(Some(processor.quote(&name)))
}

/// All arguments, space-joined, to stderr.
pub(super) fn errprint(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let message = args[1..]
        .iter()
        .map(ArgValue::as_text)
        .collect::<Vec<_>>()
        .join(" ");
    processor.write_stderr(&message)?;
    Ok(None)
}

fn include_impl(
    processor: &mut Processor,
    args: &[ArgValue],
    silent: bool,
) -> Result<Option<String>> {
    let name = args[1].as_text().to_string();
    match processor.push_include(&name) {
        Ok(()) => Ok(None),
        Err(Error::CannotOpen(_)) if silent => Ok(None),
        Err(err) => Err(err),
    }
}

pub(super) fn include(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    include_impl(processor, args, false)
}

pub(super) fn sinclude(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    include_impl(processor, args, true)
}

/// Runs the command with inherited streams; the exit status is stored
/// for `sysval`.
pub(super) fn syscmd(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let Some(command) = args.get(1).map(ArgValue::as_text).filter(|c| !c.is_empty()) else {
        // the empty command is successful
        processor.returncode = 0;
        return Ok(None);
    };
    processor.flush()?;
    let result = run_shell(command, CaptureMode::Inherit, None)?;
    processor.returncode = result.status;
    Ok(None)
}

/// Runs the command and expands to its captured stdout and stderr.
pub(super) fn esyscmd(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let Some(command) = args.get(1).map(ArgValue::as_text).filter(|c| !c.is_empty()) else {
        processor.returncode = 0;
        return Ok(None);
    };
    processor.flush()?;
    let result = run_shell(command, CaptureMode::Capture, None)?;
    processor.returncode = result.status;
    Ok(non_empty(&result.output))
}

pub(super) fn sysval(processor: &mut Processor, _args: &[ArgValue]) -> Result<Option<String>> {
    Ok(Some(processor.returncode.to_string()))
}

fn make_temp(processor: &mut Processor, pattern: &str) -> Result<Option<String>> {
    let prefix = pattern.trim_end_matches('X');
    let prefix_path = Path::new(prefix);
    let (dir, stem) = match prefix_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => (
            parent.to_path_buf(),
            prefix_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
        _ => (std::env::temp_dir(), prefix.to_string()),
    };
    let (_file, path) = tempfile::Builder::new()
        .prefix(&stem)
        .tempfile_in(dir)?
        .keep()
        .map_err(|err| Error::Io(err.error))?;
    Ok(Some(processor.quote(&path.display().to_string())))
}

/// Trailing `X`s in the pattern are stripped and a fresh file is
/// created; the quoted path is the expansion.
pub(super) fn maketemp(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let pattern = args[1].as_text().to_string();
    make_temp(processor, &pattern)
}

pub(super) fn mkstemp(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let pattern = args[1].as_text().to_string();
    make_temp(processor, &pattern)
}

/// Flushes the sinks and terminates with the given code (default 0);
/// still-diverted text is discarded.
pub(super) fn m4exit(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let code = match args.get(1).map(ArgValue::as_text).filter(|s| !s.is_empty()) {
        Some(text) => parse_number(text)? as i32,
        None => 0,
    };
    processor.flush()?;
    Err(Error::Exit(code))
}

/// Registers deferred text, re-fed at EOF: all arguments space-joined,
/// unquoted (just the first in traditional mode).
pub(super) fn m4wrap(processor: &mut Processor, args: &[ArgValue]) -> Result<Option<String>> {
    let text = if processor.config.no_gnu_extensions {
        args[1].as_text().to_string()
    } else {
        processor.dump_args(args, false, " ")
    };
    processor.wrap_queue.push_back(text);
    Ok(None)
}
