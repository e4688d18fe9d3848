//! Platform shell execution for the mfour macro processor.
//!
//! `syscmd` runs a command with inherited standard streams; `esyscmd`
//! captures the command's output. Both report the exit status as data:
//! a failing command is not an error here, the processor stores the
//! status so `sysval` can report it later.

pub mod platform;
pub mod shell;

pub use platform::shell_command;
pub use shell::{run_shell, CaptureMode, ShellError, ShellOutput};
