// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::plan::{Level, WorkflowPlan, WorkflowStep};
use serde_json::{json, Value};

// ── Step factory functions ──────────────────────────────────────────────────

pub fn step(id: &str, action: &str, parameters: Value) -> WorkflowStep {
    WorkflowStep::new(id, action, parameters).with_description(format!("{action} {id}"))
}

pub fn create_file_step(id: &str, path: &str, content: &str) -> WorkflowStep {
    step(id, "create_file", json!({"path": path, "content": content}))
}

pub fn command_step(id: &str, command: &str) -> WorkflowStep {
    step(id, "execute_command", json!({"command": command}))
}

pub fn ai_step(id: &str, prompt: &str) -> WorkflowStep {
    step(id, "ai_generate", json!({"prompt": prompt}))
}

// ── Plan factory functions ──────────────────────────────────────────────────

pub fn plan(id: &str, steps: Vec<WorkflowStep>) -> WorkflowPlan {
    let mut plan = WorkflowPlan::new(id, format!("task for {id}"), steps);
    plan.risk_level = Level::Low;
    plan.complexity = Level::Low;
    plan
}

pub fn approved_plan(id: &str, steps: Vec<WorkflowStep>) -> WorkflowPlan {
    let mut plan = plan(id, steps);
    plan.approve("tester", 1_000_000);
    plan
}

// ── Planner response fixtures ───────────────────────────────────────────────

/// A planner reply for `steps`, fenced the way chat models usually answer.
pub fn plan_response(task: &str, risk: &str, steps: Value) -> String {
    let body = json!({
        "task": task,
        "description": format!("Plan for {task}"),
        "estimatedDuration": "5m",
        "complexity": "low",
        "riskLevel": risk,
        "steps": steps,
        "approvalRequired": false,
    });
    format!("Here is the plan:\n```json\n{body:#}\n```\n")
}
