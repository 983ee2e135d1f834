// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoints and the per-step execution records they capture.

use crate::context::ContextSnapshot;
use crate::id::{CheckpointId, StepId};
use crate::plan::{StepStatus, WorkflowPlan};
use crate::state::OrchestratorState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Who approved the plan a step ran under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalInfo {
    pub approved_by: String,
    /// Epoch milliseconds
    pub approved_at: u64,
}

/// Live record of one step's execution, keyed by step id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionState {
    pub step_id: StepId,
    pub action: String,
    #[serde(default)]
    pub parameters: Value,
    pub status: StepStatus,
    /// Context captured when the step started
    #[serde(default)]
    pub context: ContextSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalInfo>,
    pub start_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
    /// Handler invocations so far, retries included
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolExecutionState {
    pub fn duration_ms(&self) -> Option<u64> {
        self.end_time.map(|end| end.saturating_sub(self.start_time))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeKind {
    Created,
    Modified,
    Deleted,
}

impl fmt::Display for FileChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileChangeKind::Created => write!(f, "created"),
            FileChangeKind::Modified => write!(f, "modified"),
            FileChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// A workspace file touched by a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: String,
    pub kind: FileChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
    pub timestamp: u64,
}

/// Immutable snapshot of a session. Restoring one never removes it from the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Epoch milliseconds
    pub timestamp: u64,
    pub state: OrchestratorState,
    #[serde(default)]
    pub context: ContextSnapshot,
    #[serde(default)]
    pub tool_states: BTreeMap<StepId, ToolExecutionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<WorkflowPlan>,
    #[serde(default)]
    pub file_changes: Vec<FileChange>,
}

impl Checkpoint {
    /// True when both checkpoints captured the same session contents.
    pub fn same_contents(&self, other: &Checkpoint) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.state == other.state
            && self.context == other.context
            && self.tool_states == other.tool_states
            && self.plan == other.plan
            && self.file_changes == other.file_changes
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
