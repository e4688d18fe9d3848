//! Shared helpers for the integration tests.

use mfour::{CaptureBuffer, Config, Processor, Result};

/// Default configuration with sync lines off, so outputs compare
/// byte-for-byte without `#line` directives.
pub fn plain_config() -> Config {
    let mut config = Config::default();
    config.sync_output = false;
    config
}

/// Expands `input` under [`plain_config`], panicking on error.
pub fn expand_plain(input: &str) -> String {
    mfour::expand(input, plain_config()).expect("expansion failed")
}

/// Runs `input` with captured stdout and stderr sinks.
pub fn run_with_sinks(input: &str, config: Config) -> (Result<()>, String, String) {
    let out = CaptureBuffer::new();
    let err = CaptureBuffer::new();
    let mut processor = Processor::new(config)
        .with_output(Box::new(out.clone()))
        .with_stderr(Box::new(err.clone()));
    let result = processor.process_string(input);
    (result, out.contents(), err.contents())
}

/// Runs `input` with captured stdout and trace sinks.
pub fn run_with_trace(input: &str, config: Config) -> (Result<()>, String, String) {
    let out = CaptureBuffer::new();
    let trace = CaptureBuffer::new();
    let mut processor = Processor::new(config)
        .with_output(Box::new(out.clone()))
        .with_trace_sink(Box::new(trace.clone()));
    let result = processor.process_string(input);
    (result, out.contents(), trace.contents())
}
