// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bash-backed command runner.

use super::{CommandError, CommandOutput, CommandRunner};
use crate::subprocess::{run_with_timeout, SubprocessError, SHELL_COMMAND_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Runs commands with `bash -c` under strict mode, killing them on timeout.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    timeout: Duration,
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new(SHELL_COMMAND_TIMEOUT)
    }
}

impl ShellCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new("bash");
        cmd.arg("-c")
            .arg(format!("set -euo pipefail\n{command}"))
            .current_dir(cwd)
            .kill_on_drop(true);

        let output = run_with_timeout(cmd, self.timeout, "shell command")
            .await
            .map_err(|e| match e {
                SubprocessError::TimedOut { .. } => CommandError::Timeout(e.to_string()),
                SubprocessError::Io { .. } => CommandError::Spawn(e.to_string()),
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
