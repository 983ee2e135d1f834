// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only history records.

use crate::state::OrchestratorState;
use serde::{Deserialize, Serialize};

/// One entry in the state history. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTransitionRecord {
    /// State the orchestrator left
    pub from: OrchestratorState,
    /// State the orchestrator entered
    #[serde(rename = "targetState")]
    pub target: OrchestratorState,
    /// Epoch milliseconds
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// An error observed by the orchestrator and the state it happened in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub error: String,
    pub timestamp: u64,
    pub state: OrchestratorState,
}
