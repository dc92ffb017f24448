use crate::domain::errors::CommandError;
use crate::domain::ops::{CommandOutput, CommandSpec};
use crate::domain::ports::CommandRunner;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs commands as child processes, without a shell.
pub struct ProcessCommandRunner {
    timeout: Duration,
}

impl ProcessCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, CommandError> {
        info!(command = %command, "Running command");

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::Spawn {
                program: command.program.clone(),
                reason: e.to_string(),
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| CommandError::Spawn {
                program: command.program.clone(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                return Err(CommandError::Timeout {
                    command: command.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stdout.trim().is_empty() {
            debug!(command = %command, "stdout: {}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!(command = %command, "stderr: {}", stderr.trim());
        }

        if !output.status.success() {
            warn!(command = %command, status = ?output.status.code(), "Command exited with failure");
            return Err(CommandError::ExitStatus {
                command: command.to_string(),
                code: output.status.code(),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let runner = ProcessCommandRunner::new(Duration::from_secs(5));
        let output = runner
            .run(&CommandSpec::new("echo", ["sha256:abc"]))
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "sha256:abc");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        let runner = ProcessCommandRunner::new(Duration::from_secs(5));
        let err = runner
            .run(&CommandSpec::new("sh", ["-c", "exit 3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::ExitStatus { code: Some(3), .. }));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let runner = ProcessCommandRunner::new(Duration::from_secs(5));
        let err = runner
            .run(&CommandSpec::new("definitely-not-a-real-binary-xyz", Vec::<String>::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let runner = ProcessCommandRunner::new(Duration::from_millis(100));
        let err = runner
            .run(&CommandSpec::new("sleep", ["5"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }
}
