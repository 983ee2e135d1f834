// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One state of the workflow orchestrator. IDLE is initial.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestratorState {
    #[default]
    Idle,
    Initializing,
    Planning,
    PendingApproval,
    Approved,
    Executing,
    Evaluating,
    Completed,
    Failed,
    Cancelled,
    RollingBack,
    ErrorRecovery,
    ContextUpdating,
    CheckpointCreating,
    CheckpointRestoring,
}

impl OrchestratorState {
    /// Every state, in declaration order.
    pub const ALL: [OrchestratorState; 15] = [
        OrchestratorState::Idle,
        OrchestratorState::Initializing,
        OrchestratorState::Planning,
        OrchestratorState::PendingApproval,
        OrchestratorState::Approved,
        OrchestratorState::Executing,
        OrchestratorState::Evaluating,
        OrchestratorState::Completed,
        OrchestratorState::Failed,
        OrchestratorState::Cancelled,
        OrchestratorState::RollingBack,
        OrchestratorState::ErrorRecovery,
        OrchestratorState::ContextUpdating,
        OrchestratorState::CheckpointCreating,
        OrchestratorState::CheckpointRestoring,
    ];

    /// States a workflow rests in until a new one is started.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrchestratorState::Completed | OrchestratorState::Failed | OrchestratorState::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrchestratorState::Idle => "IDLE",
            OrchestratorState::Initializing => "INITIALIZING",
            OrchestratorState::Planning => "PLANNING",
            OrchestratorState::PendingApproval => "PENDING_APPROVAL",
            OrchestratorState::Approved => "APPROVED",
            OrchestratorState::Executing => "EXECUTING",
            OrchestratorState::Evaluating => "EVALUATING",
            OrchestratorState::Completed => "COMPLETED",
            OrchestratorState::Failed => "FAILED",
            OrchestratorState::Cancelled => "CANCELLED",
            OrchestratorState::RollingBack => "ROLLING_BACK",
            OrchestratorState::ErrorRecovery => "ERROR_RECOVERY",
            OrchestratorState::ContextUpdating => "CONTEXT_UPDATING",
            OrchestratorState::CheckpointCreating => "CHECKPOINT_CREATING",
            OrchestratorState::CheckpointRestoring => "CHECKPOINT_RESTORING",
        }
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
