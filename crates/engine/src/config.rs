// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator configuration

use crate::env;
use pilot_core::SessionId;
use std::path::PathBuf;
use std::time::Duration;

/// Consecutive errors before recovery gives up and fails the workflow.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// Autosave period.
pub const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

/// Retries granted to a step the planner did not give a budget.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Tunables for one orchestrator session
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub max_consecutive_errors: u32,
    pub checkpoint_interval: Duration,
    /// Re-run retryable step failures up to the step's `max_retries`
    pub auto_retry: bool,
    /// Approve plans that do not require approval without waiting for a caller
    pub auto_approve: bool,
    pub default_max_retries: u32,
    /// Kill shell commands that run longer than this
    pub command_timeout: Duration,
    /// Directory commands run in and relative paths resolve against
    pub workspace_root: PathBuf,
    /// Root for durable checkpoints; `None` keeps checkpoints in memory only
    pub state_dir: Option<PathBuf>,
    /// Resume a previously persisted session instead of starting a fresh one
    pub session_id: Option<SessionId>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            auto_retry: true,
            auto_approve: false,
            default_max_retries: DEFAULT_MAX_RETRIES,
            command_timeout: pilot_adapters::subprocess::SHELL_COMMAND_TIMEOUT,
            workspace_root: PathBuf::from("."),
            state_dir: None,
            session_id: None,
        }
    }
}

impl OrchestratorConfig {
    /// Defaults overridden by `PILOT_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_consecutive_errors: env::max_consecutive_errors()
                .unwrap_or(defaults.max_consecutive_errors),
            checkpoint_interval: env::checkpoint_interval()
                .unwrap_or(defaults.checkpoint_interval),
            auto_retry: env::auto_retry().unwrap_or(defaults.auto_retry),
            auto_approve: env::auto_approve().unwrap_or(defaults.auto_approve),
            default_max_retries: env::default_max_retries()
                .unwrap_or(defaults.default_max_retries),
            command_timeout: env::command_timeout().unwrap_or(defaults.command_timeout),
            workspace_root: defaults.workspace_root,
            state_dir: env::state_dir(),
            session_id: env::session_id().map(SessionId::new),
        }
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn with_session_id(mut self, id: impl Into<SessionId>) -> Self {
        self.session_id = Some(id.into());
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
