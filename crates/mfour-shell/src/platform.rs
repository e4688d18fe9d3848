use std::process::Command;

/// Builds a command that runs `command_str` through the platform shell.
#[cfg(windows)]
pub fn shell_command(command_str: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command_str);
    cmd
}

/// Builds a command that runs `command_str` through the platform shell.
#[cfg(not(windows))]
pub fn shell_command(command_str: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_str);
    cmd
}
