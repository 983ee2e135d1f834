// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque editor/workspace context captured for prompts and checkpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializable blob produced by the context provider.
///
/// The orchestrator never inspects the contents; it embeds them in planning
/// prompts and stores them in checkpoints and tool execution records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSnapshot(pub Value);

impl Default for ContextSnapshot {
    fn default() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }
}

impl ContextSnapshot {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Pretty JSON for embedding in prompts.
    pub fn to_prompt_string(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

impl From<Value> for ContextSnapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
