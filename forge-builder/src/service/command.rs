//! Command execution service
//!
//! Runs one build command line through a shell inside a working directory
//! and captures its exit code and output streams.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code, `-1` when terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Both streams formatted for an error report
    pub fn details(&self) -> String {
        format!("Stdout: {}\n Stderr: {}", self.stdout, self.stderr)
    }
}

/// Errors that prevent a command from producing an exit code
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for build command: {0}")]
    Wait(#[source] std::io::Error),

    #[error("build command timed out after {0:?}")]
    TimedOut(Duration),
}

/// Service trait for running build commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Executes a command line in the given working directory
    ///
    /// Blocks the calling task until the command finishes. A non-zero exit
    /// code is not an error at this level.
    async fn execute(
        &self,
        working_dir: &Path,
        command_line: &str,
    ) -> Result<CommandOutput, CommandError>;
}

/// Runs command lines through `<shell> -c`
pub struct ShellCommandRunner {
    shell: PathBuf,
    timeout: Option<Duration>,
}

impl ShellCommandRunner {
    /// Creates a new shell command runner
    ///
    /// # Arguments
    /// * `shell` - Shell binary, e.g. `/bin/bash`
    /// * `timeout` - Per-command limit; the child is killed when exceeded
    pub fn new(shell: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn execute(
        &self,
        working_dir: &Path,
        command_line: &str,
    ) -> Result<CommandOutput, CommandError> {
        // Rendered lines may contain the payload key; callers log a redacted copy.
        debug!("Spawning {} in {}", self.shell.display(), working_dir.display());

        // The command line is one argv element, so it needs no re-quoting.
        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                shell: self.shell.display().to_string(),
                source,
            })?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| CommandError::TimedOut(limit))?,
            None => child.wait_with_output().await,
        }
        .map_err(CommandError::Wait)?;

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            "Command finished: exit_code={}, stdout_len={}, stderr_len={}",
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}
