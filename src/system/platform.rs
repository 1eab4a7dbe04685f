//! Shell command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// Commands are killed after this long
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of a shell command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

impl CommandOutput {
    fn failure(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
            returncode: -1,
        }
    }
}

/// Lower-case OS family: `linux`, `macos`, `windows`, ...
pub fn platform_name() -> &'static str {
    std::env::consts::OS
}

/// Run `command` through the platform shell with the default timeout
pub async fn run_command(command: &str) -> CommandOutput {
    run_command_with_timeout(command, COMMAND_TIMEOUT).await
}

/// Run `command` through the platform shell
///
/// Never fails: spawn errors and timeouts are reported in `stderr` with return code -1.
pub async fn run_command_with_timeout(command: &str, timeout: Duration) -> CommandOutput {
    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };
    execute(cmd, command, timeout).await
}

/// Run a program with literal arguments, no shell involved
///
/// Same error reporting as [`run_command`]; an empty `argv` is a failure.
pub async fn run_program(argv: &[&str]) -> CommandOutput {
    let Some((program, args)) = argv.split_first() else {
        return CommandOutput::failure("No command given");
    };
    let mut cmd = Command::new(program);
    cmd.args(args);
    execute(cmd, &argv.join(" "), COMMAND_TIMEOUT).await
}

async fn execute(mut cmd: Command, command: &str, timeout: Duration) -> CommandOutput {
    cmd.kill_on_drop(true).stdin(std::process::Stdio::null());

    tracing::debug!(%command, "Running command");

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => {
            let returncode = output.status.code().unwrap_or(-1);
            CommandOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                returncode,
            }
        }
        Ok(Err(e)) => CommandOutput::failure(e.to_string()),
        Err(_) => {
            tracing::warn!(%command, "Command timed out");
            CommandOutput::failure("Command timed out")
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_command() {
        let output = run_command("echo hello").await;
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.returncode, 0);
    }

    #[tokio::test]
    async fn test_failing_command_keeps_stderr() {
        let output = run_command("echo oops >&2; exit 3").await;
        assert!(!output.success);
        assert_eq!(output.returncode, 3);
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_timeout() {
        let output = run_command_with_timeout("sleep 5", Duration::from_millis(100)).await;
        assert_eq!(output, CommandOutput::failure("Command timed out"));
    }

    #[tokio::test]
    async fn test_program_arguments_are_literal() {
        let output = run_program(&["echo", "a;", "$(id)", "|", "b"]).await;
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "a; $(id) | b");

        let missing = run_program(&["definitely-not-a-real-binary"]).await;
        assert!(!missing.success);
        assert_eq!(missing.returncode, -1);
        assert_eq!(run_program(&[]).await.stderr, "No command given");
    }
}
