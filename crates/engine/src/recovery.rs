// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error recovery policy

use pilot_core::OrchestratorState;

/// Where ERROR_RECOVERY leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    /// Return to IDLE so the caller can try again
    Resume,
    /// Too many errors in a row
    GiveUp,
}

impl RecoveryDecision {
    pub fn target(self) -> OrchestratorState {
        match self {
            RecoveryDecision::Resume => OrchestratorState::Idle,
            RecoveryDecision::GiveUp => OrchestratorState::Failed,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            RecoveryDecision::Resume => "error recovery completed",
            RecoveryDecision::GiveUp => "max consecutive errors reached",
        }
    }
}

/// Bounds how many consecutive errors a session tolerates
#[derive(Debug, Clone, Copy)]
pub struct ErrorRecovery {
    max_consecutive_errors: u32,
}

impl ErrorRecovery {
    pub fn new(max_consecutive_errors: u32) -> Self {
        Self {
            max_consecutive_errors,
        }
    }

    /// Decide given the counter after it was bumped for the current error.
    pub fn decide(&self, consecutive_errors: u32) -> RecoveryDecision {
        if consecutive_errors >= self.max_consecutive_errors {
            RecoveryDecision::GiveUp
        } else {
            RecoveryDecision::Resume
        }
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
