// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow plans and their steps.

use crate::action;
use crate::id::{PlanId, StepId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Four-level scale used for both plan complexity and plan risk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

pub type Complexity = Level;
pub type RiskLevel = Level;

impl Level {
    pub fn is_high(self) -> bool {
        self >= Level::High
    }
}

impl FromStr for Level {
    type Err = String;

    /// Case-insensitive parse of `low`, `medium`, `high` or `critical`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            "critical" => Ok(Level::Critical),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::Medium => write!(f, "medium"),
            Level::High => write!(f, "high"),
            Level::Critical => write!(f, "critical"),
        }
    }
}

/// Lifecycle of a plan as seen by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Executing,
    Completed,
    Failed,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStatus::Draft => write!(f, "draft"),
            PlanStatus::Pending => write!(f, "pending"),
            PlanStatus::Approved => write!(f, "approved"),
            PlanStatus::Executing => write!(f, "executing"),
            PlanStatus::Completed => write!(f, "completed"),
            PlanStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Status of a single step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl StepStatus {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Cancelled
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Executing => write!(f, "executing"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One unit of work in a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: StepId,
    pub description: String,
    /// Capability name, e.g. `create_file` or `execute_command`
    pub action: String,
    #[serde(default)]
    pub parameters: Value,
    /// Ids of steps in the same plan that must complete first
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub max_retries: u32,
    /// Data a handler needs to revert this step's effects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_data: Option<Value>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<StepId>, action: impl Into<String>, parameters: Value) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            action: action.into(),
            parameters,
            dependencies: Vec::new(),
            status: StepStatus::Pending,
            result: None,
            error: None,
            start_time: None,
            end_time: None,
            retry_count: 0,
            max_retries: 0,
            rollback_data: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, id: impl Into<StepId>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Retries are exhausted; a failure now forces the plan to roll back.
    pub fn should_rollback(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// String parameter lookup.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }
}

/// Structured, steppable translation of a natural-language task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPlan {
    pub id: PlanId,
    pub task: String,
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub estimated_duration: String,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub rollback_plan: Vec<String>,
    pub approval_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<u64>,
    #[serde(default)]
    pub status: PlanStatus,
}

impl WorkflowPlan {
    /// New draft plan; approval is required until proven otherwise.
    pub fn new(id: impl Into<PlanId>, task: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        let task = task.into();
        Self {
            id: id.into(),
            description: task.clone(),
            task,
            steps,
            estimated_duration: String::new(),
            complexity: Level::Medium,
            risk_level: Level::Medium,
            dependencies: Vec::new(),
            prerequisites: Vec::new(),
            success_criteria: Vec::new(),
            rollback_plan: Vec::new(),
            approval_required: true,
            approved_by: None,
            approved_at: None,
            status: PlanStatus::Draft,
        }
    }

    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_mut(&mut self, id: &str) -> Option<&mut WorkflowStep> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    pub fn is_approved(&self) -> bool {
        self.status == PlanStatus::Approved
    }

    /// High risk or any mutating step forces approval.
    pub fn requires_approval(&self) -> bool {
        self.risk_level.is_high() || self.steps.iter().any(|s| action::is_mutating(&s.action))
    }

    /// Record approval.
    pub fn approve(&mut self, approver: impl Into<String>, epoch_ms: u64) {
        self.approved_by = Some(approver.into());
        self.approved_at = Some(epoch_ms);
        self.status = PlanStatus::Approved;
    }

    pub fn all_steps_completed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }

    pub fn any_step_failed(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.status, StepStatus::Failed | StepStatus::Cancelled))
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
