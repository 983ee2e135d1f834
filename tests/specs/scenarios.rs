//! End-to-end workflow scenarios.

use crate::prelude::*;
use pilot_adapters::FileCall;
use pilot_core::{OrchestratorState::*, PlanStatus, StepId, StepStatus};
use pilot_engine::OrchestratorError;
use serde_json::json;
use similar_asserts::assert_eq;

#[tokio::test]
async fn dependencies_run_first_even_when_listed_last() {
    let h = Harness::new();
    h.files.insert("b.txt", "before");

    let report = h
        .run(json!([
            {"id": "B", "action": "modify_file", "parameters": {"path": "b.txt", "content": "after"}, "dependencies": ["A"]},
            {"id": "A", "action": "create_file", "parameters": {"path": "a.txt", "content": "new"}},
        ]))
        .await;

    assert_eq!(report.final_state, Completed);
    assert_eq!(
        h.files.calls(),
        vec![
            FileCall::Create { path: "a.txt".into(), content: "new".into() },
            FileCall::Modify { path: "b.txt".into(), content: "after".into() },
        ]
    );
    assert_eq!(
        report.results.keys().map(StepId::as_str).collect::<Vec<_>>(),
        vec!["A", "B"]
    );
}

#[tokio::test]
async fn failure_without_retry_budget_rolls_back() {
    let h = Harness::new();
    h.runner.push_output(1, "", "tests failed");

    let report = h
        .run(json!([
            {"id": "write", "action": "create_file", "parameters": {"path": "new.rs", "content": "fn main() {}"}},
            {"id": "test", "action": "execute_command", "parameters": {"command": "cargo test"}, "dependencies": ["write"], "maxRetries": 0},
        ]))
        .await;

    assert_eq!(report.final_state, Failed);
    assert!(report.rolled_back);
    assert_eq!(h.runner.calls().len(), 1);
    assert_eq!(h.files.get("new.rs"), None);

    let history = h.orchestrator.state_history();
    assert!(history
        .iter()
        .any(|r| r.from == Executing && r.target == RollingBack));
    let test_step = h.orchestrator.current_plan().unwrap().step("test").cloned().unwrap();
    assert_eq!(test_step.status, StepStatus::Failed);
    assert!(test_step.should_rollback());
    let write_step = h.orchestrator.current_plan().unwrap().step("write").cloned().unwrap();
    assert_eq!(write_step.status, StepStatus::Cancelled);
    assert!(h.orchestrator.file_changes().is_empty());
}

#[tokio::test]
async fn executing_an_unapproved_plan_changes_nothing() {
    let h = Harness::new();
    h.plan(trivial_steps()).await;
    let plan = h.orchestrator.current_plan();
    let history = h.orchestrator.state_history();

    let err = h.orchestrator.execute_plan().await.unwrap_err();

    assert!(
        matches!(err, OrchestratorError::PlanNotApproved { status: PlanStatus::Pending }),
        "{err}"
    );
    assert_eq!(h.orchestrator.current_state(), PendingApproval);
    assert_eq!(h.orchestrator.current_plan(), plan);
    assert_eq!(h.orchestrator.state_history(), history);
    assert!(h.orchestrator.tool_execution_states().is_empty());
}

#[tokio::test]
async fn transient_failures_are_retried_and_counted() {
    let h = Harness::new();
    h.runner.push_output(1, "", "flaky");
    h.runner.push_output(0, "ok", "");

    let report = h
        .run(json!([
            {"id": "build", "action": "execute_command", "parameters": {"command": "make"}, "maxRetries": 2},
        ]))
        .await;

    assert_eq!(report.final_state, Completed);
    let metrics = h.orchestrator.tool_metrics();
    assert_eq!(metrics["execute_command"].total_executions, 2);
    assert_eq!(metrics["execute_command"].success_rate, 0.5);
    let tools = h.orchestrator.tool_execution_states();
    assert_eq!(tools[&StepId::new("build")].attempts, 2);
    assert_eq!(
        tools[&StepId::new("build")].approval.as_ref().map(|a| a.approved_by.clone()),
        Some("reviewer".to_string())
    );
}

#[tokio::test]
async fn workflows_can_be_run_back_to_back() {
    let h = Harness::new();
    h.gateway.set_fallback("generated");

    let first = h.run(trivial_steps()).await;
    let second = h.run(trivial_steps()).await;

    assert_eq!(first.final_state, Completed);
    assert_eq!(second.final_state, Completed);
    let plan_ids: Vec<_> = h
        .orchestrator
        .state_history()
        .iter()
        .filter_map(|r| r.metadata.as_ref()?.get("planId").cloned())
        .collect();
    assert!(plan_ids.len() >= 2);
    assert_ne!(plan_ids.first(), plan_ids.last());
}
