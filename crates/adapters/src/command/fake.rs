// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake command validator and runner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CommandError, CommandOutput, CommandRunner, CommandValidator};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Validator that rejects an explicit set of commands
#[derive(Clone, Default)]
pub struct FakeCommandValidator {
    denied: Arc<Mutex<HashSet<String>>>,
    checked: Arc<Mutex<Vec<String>>>,
}

impl FakeCommandValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(&self, command: &str) {
        self.denied.lock().insert(command.to_string());
    }

    /// Commands passed to `validate_command`, in order
    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().clone()
    }
}

#[async_trait]
impl CommandValidator for FakeCommandValidator {
    async fn validate_command(&self, command: &str) -> Result<bool, CommandError> {
        self.checked.lock().push(command.to_string());
        if self.denied.lock().contains(command) {
            return Err(CommandError::Rejected {
                command: command.to_string(),
                reason: "denied by test policy".to_string(),
            });
        }
        Ok(true)
    }
}

struct FakeRunnerState {
    outputs: VecDeque<Result<CommandOutput, CommandError>>,
    calls: Vec<(String, PathBuf)>,
}

/// Runner replying from a queue; succeeds with empty output when the queue is empty
#[derive(Clone)]
pub struct FakeCommandRunner {
    inner: Arc<Mutex<FakeRunnerState>>,
}

impl Default for FakeCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeRunnerState {
                outputs: VecDeque::new(),
                calls: Vec::new(),
            })),
        }
    }

    pub fn push_output(&self, exit_code: i32, stdout: &str, stderr: &str) {
        self.inner.lock().outputs.push_back(Ok(CommandOutput {
            exit_code: Some(exit_code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }));
    }

    pub fn push_error(&self, error: CommandError) {
        self.inner.lock().outputs.push_back(Err(error));
    }

    /// Commands run so far with their working directories
    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput, CommandError> {
        let mut inner = self.inner.lock();
        inner.calls.push((command.to_string(), cwd.to_path_buf()));
        inner.outputs.pop_front().unwrap_or_else(|| {
            Ok(CommandOutput {
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            })
        })
    }
}
