//! The mfour command-line front-end.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use mfour::{Config, DebugFlags, Error, Macro, Processor};

#[derive(Debug, Parser)]
#[command(name = "mfour", version, about = "An m4-style macro processor")]
struct Cli {
    /// Source file to process.
    #[arg(short = 's', long = "source", value_name = "PATH")]
    source: PathBuf,

    /// Extra directories searched for relative include names.
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Suppress GNU extensions and predefine the legacy platform names.
    #[arg(short = 'G', long = "traditional")]
    traditional: bool,

    /// Register every builtin under an `m4_` prefix.
    #[arg(short = 'P', long = "prefix-builtins")]
    prefix_builtins: bool,

    /// Maximum macro recursion depth.
    #[arg(long = "nesting-limit", value_name = "N", default_value_t = mfour::config::DEFAULT_NESTING_LIMIT)]
    nesting_limit: usize,

    /// Do not emit `#line` synchronization directives.
    #[arg(long = "no-synclines")]
    no_synclines: bool,

    /// Debug flags (letters from `aeqtlfpcixdV`).
    #[arg(short = 'd', long = "debug", value_name = "FLAGS")]
    debug: Option<String>,

    /// Redirect trace output to a file.
    #[arg(long = "debugfile", value_name = "PATH")]
    debugfile: Option<PathBuf>,

    /// Trace the named macro (repeatable).
    #[arg(short = 't', long = "trace", value_name = "NAME")]
    trace: Vec<String>,

    /// Predefine NAME, optionally with a value.
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    define: Vec<String>,

    /// Undefine NAME before processing starts.
    #[arg(short = 'U', long = "undefine", value_name = "NAME")]
    undefine: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<Error>() {
            Some(Error::Exit(code)) => ExitCode::from(*code as u8),
            _ => {
                eprintln!("mfour: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::default();
    config.include_path.extend(cli.include);
    config.no_gnu_extensions = cli.traditional;
    config.prefix_all_builtins = cli.prefix_builtins;
    config.nesting_limit = cli.nesting_limit;
    config.sync_output = !cli.no_synclines;

    let mut processor = Processor::new(config);

    if let Some(flags) = &cli.debug {
        processor.set_debug_flags(DebugFlags::parse(flags)?);
    }
    if let Some(path) = &cli.debugfile {
        processor
            .set_trace_file(Some(path.as_path()))
            .with_context(|| format!("cannot open debug file {}", path.display()))?;
    }
    for name in &cli.trace {
        processor.macros.set_traced(name, true);
    }
    for definition in &cli.define {
        let (name, value) = match definition.split_once('=') {
            Some((name, value)) => (name, value),
            None => (definition.as_str(), ""),
        };
        processor.macros.insert(Macro::text(name, value));
    }
    for name in &cli.undefine {
        processor.macros.undefine(name);
    }

    let source = cli.source.to_string_lossy().into_owned();
    processor.process_file(&source)?;
    Ok(())
}
