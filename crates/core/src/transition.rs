// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legal state-to-state edges of the orchestrator.
//!
//! The table is plain data: it is built once, never mutated, and consulted
//! by the engine before every state change.
//!
//! ```text
//! IDLE                 → INITIALIZING | PLANNING | CHECKPOINT_RESTORING
//! INITIALIZING         → PLANNING | ERROR_RECOVERY
//! PLANNING             → PENDING_APPROVAL | ERROR_RECOVERY | CANCELLED
//! PENDING_APPROVAL     → APPROVED | CANCELLED | ERROR_RECOVERY
//! APPROVED             → EXECUTING | ERROR_RECOVERY
//! EXECUTING            → EVALUATING | ROLLING_BACK | ERROR_RECOVERY | CANCELLED
//! EVALUATING           → COMPLETED | FAILED | ROLLING_BACK | CONTEXT_UPDATING
//! COMPLETED            → IDLE | CHECKPOINT_CREATING
//! FAILED               → ROLLING_BACK | ERROR_RECOVERY | IDLE
//! ROLLING_BACK         → FAILED | ERROR_RECOVERY | IDLE
//! ERROR_RECOVERY       → IDLE | FAILED
//! CONTEXT_UPDATING     → COMPLETED | EXECUTING
//! CHECKPOINT_CREATING  → IDLE
//! CHECKPOINT_RESTORING → IDLE | ERROR_RECOVERY
//! CANCELLED            → (none)
//! ```

use crate::state::OrchestratorState;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use thiserror::Error;

/// A requested state change that the table does not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: OrchestratorState,
    pub to: OrchestratorState,
}

/// Problems found when checking a table for completeness
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("state {0} has no entry in the transition table")]
    MissingState(OrchestratorState),
    #[error("state {0} is reachable but has no outgoing edge")]
    DeadEnd(OrchestratorState),
}

/// Immutable adjacency table of allowed transitions
#[derive(Debug, Clone)]
pub struct TransitionTable {
    edges: BTreeMap<OrchestratorState, BTreeSet<OrchestratorState>>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TransitionTable {
    /// The orchestrator's transition table.
    pub fn standard() -> Self {
        use OrchestratorState::*;

        let rows: [(OrchestratorState, &[OrchestratorState]); 15] = [
            (Idle, &[Initializing, Planning, CheckpointRestoring]),
            (Initializing, &[Planning, ErrorRecovery]),
            (Planning, &[PendingApproval, ErrorRecovery, Cancelled]),
            (PendingApproval, &[Approved, Cancelled, ErrorRecovery]),
            (Approved, &[Executing, ErrorRecovery]),
            (Executing, &[Evaluating, RollingBack, ErrorRecovery, Cancelled]),
            (Evaluating, &[Completed, Failed, RollingBack, ContextUpdating]),
            (Completed, &[Idle, CheckpointCreating]),
            (Failed, &[RollingBack, ErrorRecovery, Idle]),
            (Cancelled, &[]),
            (RollingBack, &[Failed, ErrorRecovery, Idle]),
            (ErrorRecovery, &[Idle, Failed]),
            (ContextUpdating, &[Completed, Executing]),
            (CheckpointCreating, &[Idle]),
            (CheckpointRestoring, &[Idle, ErrorRecovery]),
        ];

        Self::from_rows(rows.iter().map(|(from, to)| (*from, to.to_vec())))
    }

    /// Build a table from explicit rows. States without a row have no entry.
    pub fn from_rows(
        rows: impl IntoIterator<Item = (OrchestratorState, Vec<OrchestratorState>)>,
    ) -> Self {
        let edges = rows
            .into_iter()
            .map(|(from, to)| (from, to.into_iter().collect()))
            .collect();
        Self { edges }
    }

    /// Allowed targets from `from`, empty when the state has no entry.
    pub fn targets(&self, from: OrchestratorState) -> Vec<OrchestratorState> {
        self.edges
            .get(&from)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains_state(&self, state: OrchestratorState) -> bool {
        self.edges.contains_key(&state)
    }

    pub fn is_allowed(&self, from: OrchestratorState, to: OrchestratorState) -> bool {
        self.edges.get(&from).is_some_and(|set| set.contains(&to))
    }

    /// Check a transition, producing the error the engine surfaces.
    pub fn validate(
        &self,
        from: OrchestratorState,
        to: OrchestratorState,
    ) -> Result<(), TransitionError> {
        if self.is_allowed(from, to) {
            Ok(())
        } else {
            Err(TransitionError { from, to })
        }
    }

    /// States reachable from `start` by following edges (including `start`).
    pub fn reachable_from(&self, start: OrchestratorState) -> BTreeSet<OrchestratorState> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(state) = queue.pop_front() {
            for next in self.targets(state) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Every state has an entry, and every state reachable from IDLE other
    /// than CANCELLED can leave.
    pub fn check_complete(&self) -> Result<(), TableError> {
        for state in OrchestratorState::ALL {
            if !self.contains_state(state) {
                return Err(TableError::MissingState(state));
            }
        }
        for state in self.reachable_from(OrchestratorState::Idle) {
            if state != OrchestratorState::Cancelled && self.targets(state).is_empty() {
                return Err(TableError::DeadEnd(state));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
