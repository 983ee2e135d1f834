// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell command validation and execution adapters

mod shell;
mod validator;

pub use shell::ShellCommandRunner;
pub use validator::DenyListValidator;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCommandRunner, FakeCommandValidator};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from command operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command rejected: {reason}")]
    Rejected { command: String, reason: String },
    #[error("command failed to start: {0}")]
    Spawn(String),
    #[error("command timed out: {0}")]
    Timeout(String),
}

impl CommandError {
    /// Rejections are policy decisions; retrying cannot change them.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CommandError::Rejected { .. })
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Security policy gate in front of every shell command.
///
/// Returns `Ok(true)` when the command may run; a violation is reported as
/// `CommandError::Rejected` carrying the reason.
#[async_trait]
pub trait CommandValidator: Send + Sync + 'static {
    async fn validate_command(&self, command: &str) -> Result<bool, CommandError>;
}

/// Runs a validated shell command to completion
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput, CommandError>;
}
