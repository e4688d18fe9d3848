use std::io::Read;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

use crate::platform::shell_command;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("command `{0}` timed out after {1:?}")]
    Timeout(String, Duration),
    #[error("command output was not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// What happens to the child's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// The child writes straight to the inherited stdout/stderr (`syscmd`).
    Inherit,
    /// Stdout and stderr are collected and returned (`esyscmd`).
    Capture,
}

/// Result of a shell run: the exit status and whatever was captured.
#[derive(Debug, Clone)]
pub struct ShellOutput {
    /// Exit status of the command; -1 when the child was killed by a
    /// signal and no code is available.
    pub status: i32,
    /// Captured stdout followed by captured stderr; empty in
    /// [`CaptureMode::Inherit`].
    pub output: String,
}

/// Runs `command_str` through the platform shell.
///
/// A non-zero exit status is reported in [`ShellOutput::status`], not as
/// an error; only spawn/IO failures and timeouts fail the call.
///
/// # Notes
///
/// In capture mode the pipes are read after the child exits, so output
/// larger than the OS pipe buffer would need a streaming reader instead.
pub fn run_shell(
    command_str: &str,
    mode: CaptureMode,
    timeout: Option<Duration>,
) -> Result<ShellOutput, ShellError> {
    let mut cmd = shell_command(command_str);
    match mode {
        CaptureMode::Inherit => {
            cmd.stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }
        CaptureMode::Capture => {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }
    }

    let mut child = cmd.spawn()?;

    let status = match timeout {
        Some(duration) => match child.wait_timeout(duration)? {
            Some(status) => status,
            None => {
                child.kill()?;
                child.wait()?;
                return Err(ShellError::Timeout(command_str.to_string(), duration));
            }
        },
        None => child.wait()?,
    };

    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        let mut bytes = Vec::new();
        stdout.read_to_end(&mut bytes)?;
        output.push_str(&String::from_utf8(bytes)?);
    }
    if let Some(mut stderr) = child.stderr.take() {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes)?;
        output.push_str(&String::from_utf8(bytes)?);
    }

    Ok(ShellOutput {
        status: status.code().unwrap_or(-1),
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_echo() {
        let result = run_shell("echo hello", CaptureMode::Capture, None).unwrap();
        assert_eq!(result.status, 0);
        assert!(result.output.trim().contains("hello"));
    }

    #[test]
    fn test_capture_collects_stderr() {
        let cmd = if cfg!(windows) {
            "echo oops 1>&2"
        } else {
            "echo oops >&2"
        };
        let result = run_shell(cmd, CaptureMode::Capture, None).unwrap();
        assert!(result.output.contains("oops"));
    }

    #[test]
    fn test_nonzero_status_is_data() {
        let result = run_shell("exit 7", CaptureMode::Capture, None).unwrap();
        assert_eq!(result.status, 7);
    }

    #[test]
    fn test_inherit_returns_no_output() {
        let cmd = if cfg!(windows) { "exit 0" } else { "true" };
        let result = run_shell(cmd, CaptureMode::Inherit, None).unwrap();
        assert_eq!(result.status, 0);
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_timeout() {
        let cmd = if cfg!(windows) {
            "ping -n 3 127.0.0.1"
        } else {
            "sleep 2"
        };
        let start = std::time::Instant::now();
        let res = run_shell(cmd, CaptureMode::Capture, Some(Duration::from_millis(300)));
        assert!(matches!(res, Err(ShellError::Timeout(_, _))));
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
