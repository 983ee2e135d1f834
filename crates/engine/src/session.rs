// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutable state of one orchestrator session.
//!
//! Everything here lives behind a single `parking_lot::Mutex` owned by the
//! orchestrator. Methods are synchronous; callers hold the lock for the
//! duration of one call so every transition is observed whole.

use crate::executor::ExecutionOutcome;
use pilot_core::{
    Checkpoint, CheckpointId, ContextSnapshot, ErrorRecord, FileChange, OrchestratorState,
    StateTransitionRecord, StepId, ToolExecutionState, ToolMetricsStore, TransitionError,
    TransitionTable, WorkflowPlan,
};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub(crate) struct Session {
    pub state: OrchestratorState,
    pub history: Vec<StateTransitionRecord>,
    pub plan: Option<WorkflowPlan>,
    pub tool_states: BTreeMap<StepId, ToolExecutionState>,
    pub checkpoints: Vec<Checkpoint>,
    pub errors: Vec<ErrorRecord>,
    pub file_changes: Vec<FileChange>,
    pub metrics: ToolMetricsStore,
    pub context: ContextSnapshot,
    pub consecutive_errors: u32,
    /// Persisted checkpoints have been loaded
    pub initialized: bool,
    /// Task handed from `start_workflow` to the PLANNING entry action
    pub pending_task: Option<String>,
    /// Checkpoint handed from `restore_checkpoint` to CHECKPOINT_RESTORING
    pub pending_restore: Option<Checkpoint>,
    pub last_outcome: Option<ExecutionOutcome>,
}

impl Session {
    /// Validate against the table, append history and set the state.
    pub fn apply(
        &mut self,
        table: &TransitionTable,
        to: OrchestratorState,
        reason: Option<String>,
        metadata: Option<Value>,
        now: u64,
    ) -> Result<(), TransitionError> {
        table.validate(self.state, to)?;
        self.force_state(to, reason, metadata, now);
        Ok(())
    }

    /// Set the state without consulting the table. Still recorded in history.
    pub fn force_state(
        &mut self,
        to: OrchestratorState,
        reason: Option<String>,
        metadata: Option<Value>,
        now: u64,
    ) {
        self.history.push(StateTransitionRecord {
            from: self.state,
            target: to,
            timestamp: now,
            reason,
            metadata,
        });
        self.state = to;
    }

    pub fn record_error(&mut self, error: impl Into<String>, now: u64) {
        let error = error.into();
        tracing::warn!(state = %self.state, error = %error, "error recorded");
        self.errors.push(ErrorRecord {
            error,
            timestamp: now,
            state: self.state,
        });
    }

    /// Capture the session into a checkpoint (not appended).
    pub fn snapshot(&self, id: CheckpointId, name: &str, now: u64) -> Checkpoint {
        self.snapshot_as(self.state, id, name, now)
    }

    /// Like [`Session::snapshot`], recording `state` instead of the current one.
    pub fn snapshot_as(
        &self,
        state: OrchestratorState,
        id: CheckpointId,
        name: &str,
        now: u64,
    ) -> Checkpoint {
        Checkpoint {
            id,
            name: name.to_string(),
            description: format!("Captured in state {state}"),
            timestamp: now,
            state,
            context: self.context.clone(),
            tool_states: self.tool_states.clone(),
            plan: self.plan.clone(),
            file_changes: self.file_changes.clone(),
        }
    }

    /// Overwrite plan, tool map, file changes and context. State is left alone.
    pub fn restore_contents(&mut self, checkpoint: &Checkpoint) {
        self.plan = checkpoint.plan.clone();
        self.tool_states = checkpoint.tool_states.clone();
        self.file_changes = checkpoint.file_changes.clone();
        self.context = checkpoint.context.clone();
        self.last_outcome = None;
    }

    /// Forget everything tied to the previous plan.
    pub fn begin_plan(&mut self, plan: WorkflowPlan) {
        self.plan = Some(plan);
        self.tool_states.clear();
        self.file_changes.clear();
        self.last_outcome = None;
    }

    pub fn find_checkpoint(&self, id: &str) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.id == id)
    }

    /// Merge checkpoints loaded from storage ahead of those taken this run.
    pub fn merge_loaded(&mut self, loaded: Vec<Checkpoint>) -> usize {
        let mut merged: Vec<Checkpoint> = loaded
            .into_iter()
            .filter(|c| self.find_checkpoint(c.id.as_str()).is_none())
            .collect();
        let added = merged.len();
        merged.append(&mut self.checkpoints);
        self.checkpoints = merged;
        added
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
