// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-action execution metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate outcome of every execution of one action
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetrics {
    pub total_executions: u64,
    /// Fraction in `[0, 1]`
    pub success_rate: f64,
    /// Milliseconds
    pub avg_duration: f64,
}

impl ToolMetrics {
    /// Fold one execution into the running means.
    pub fn record(&mut self, success: bool, duration_ms: u64) {
        let previous = self.total_executions as f64;
        self.total_executions += 1;
        let total = self.total_executions as f64;
        let hit = if success { 1.0 } else { 0.0 };
        self.success_rate = (self.success_rate * previous + hit) / total;
        self.avg_duration = (self.avg_duration * previous + duration_ms as f64) / total;
    }
}

/// Metrics keyed by action name. Entries are created on first record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolMetricsStore {
    by_action: BTreeMap<String, ToolMetrics>,
}

impl ToolMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: &str, success: bool, duration_ms: u64) {
        self.by_action
            .entry(action.to_string())
            .or_default()
            .record(success, duration_ms);
    }

    pub fn get(&self, action: &str) -> Option<ToolMetrics> {
        self.by_action.get(action).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, ToolMetrics> {
        self.by_action.clone()
    }

    pub fn clear(&mut self) {
        self.by_action.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_action.is_empty()
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
