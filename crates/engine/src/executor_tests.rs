// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::FakeWorld;
use pilot_core::test_support::{approved_plan, command_step, create_file_step, step};
use pilot_core::{FakeClock, FileChangeKind};
use serde_json::json;
use yare::parameterized;

fn session_with(steps: Vec<WorkflowStep>) -> Mutex<Session> {
    let session = Session {
        state: OrchestratorState::Executing,
        plan: Some(approved_plan("plan-1", steps)),
        context: ContextSnapshot::new(json!({"from": "session"})),
        ..Session::default()
    };
    Mutex::new(session)
}

async fn run(
    world: &FakeWorld,
    session: &Mutex<Session>,
    auto_retry: bool,
) -> Result<ExecutionOutcome, OrchestratorError> {
    let registry = HandlerRegistry::with_builtins();
    let clock = FakeClock::new();
    let steps = session.lock().plan.as_ref().unwrap().steps.clone();
    StepExecutor::new(&registry, &world.collaborators, &clock, auto_retry)
        .execute_steps(steps, session)
        .await
}

fn plan_step(session: &Mutex<Session>, id: &str) -> WorkflowStep {
    session.lock().plan.as_ref().unwrap().step(id).unwrap().clone()
}

fn ids(order: &[usize], steps: &[WorkflowStep]) -> Vec<String> {
    order.iter().map(|&i| steps[i].id.to_string()).collect()
}

#[test]
fn order_puts_dependencies_first() {
    let steps = vec![
        step("c", "ai_generate", json!({})).depends_on("b"),
        step("b", "ai_generate", json!({})).depends_on("a"),
        step("a", "ai_generate", json!({})),
    ];
    let order = execution_order(&steps).unwrap();
    assert_eq!(ids(&order, &steps), ["a", "b", "c"]);
}

#[test]
fn order_of_independent_steps_covers_all() {
    let steps = vec![
        step("a", "ai_generate", json!({})),
        step("b", "ai_generate", json!({})),
        step("c", "ai_generate", json!({})).depends_on("a"),
    ];
    let order = execution_order(&steps).unwrap();
    let names = ids(&order, &steps);
    assert_eq!(names.len(), 3);
    let pos = |id: &str| names.iter().position(|n| n == id).unwrap();
    assert!(pos("a") < pos("c"));
}

#[parameterized(
    two_cycle = { vec![
        step("a", "ai_generate", json!({})).depends_on("b"),
        step("b", "ai_generate", json!({})).depends_on("a"),
    ] },
    self_loop = { vec![step("a", "ai_generate", json!({})).depends_on("a")] },
)]
fn cycles_are_rejected(steps: Vec<WorkflowStep>) {
    let err = execution_order(&steps).unwrap_err();
    assert!(matches!(err, OrchestratorError::CyclicDependency(_)), "{err}");
}

#[parameterized(
    unknown_dependency = { vec![step("a", "ai_generate", json!({})).depends_on("ghost")] },
    duplicate_id = { vec![step("a", "ai_generate", json!({})), step("a", "ai_generate", json!({}))] },
)]
fn malformed_graphs_are_invalid(steps: Vec<WorkflowStep>) {
    let err = execution_order(&steps).unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidPlan(_)), "{err}");
}

#[tokio::test]
async fn runs_steps_and_records_everything() {
    let world = FakeWorld::new();
    let session = session_with(vec![
        create_file_step("s1", "a.txt", "one"),
        create_file_step("s2", "b.txt", "two").depends_on("s1"),
    ]);

    let outcome = run(&world, &session, true).await.unwrap();

    assert_eq!(
        outcome.results.keys().map(StepId::as_str).collect::<Vec<_>>(),
        ["s1", "s2"]
    );
    assert!(outcome.failed.is_empty());
    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.rollback_required, None);
    assert_eq!(world.files.get("a.txt").as_deref(), Some("one"));
    assert_eq!(world.files.get("b.txt").as_deref(), Some("two"));

    let s = session.lock();
    let changes: Vec<_> = s
        .file_changes
        .iter()
        .map(|c| (c.path.as_str(), c.kind, c.step_id.as_ref().map(StepId::as_str)))
        .collect();
    assert_eq!(
        changes,
        [
            ("a.txt", FileChangeKind::Created, Some("s1")),
            ("b.txt", FileChangeKind::Created, Some("s2")),
        ]
    );

    let tool = &s.tool_states[&StepId::new("s1")];
    assert_eq!(tool.status, StepStatus::Completed);
    assert_eq!(tool.attempts, 1);
    assert_eq!(tool.context.as_value(), &json!({"activeFile": "src/lib.rs"}));
    assert_eq!(tool.approval.as_ref().map(|a| a.approved_by.as_str()), Some("tester"));
    assert!(tool.end_time.is_some());

    let metrics = s.metrics.get("create_file").unwrap();
    assert_eq!(metrics.total_executions, 2);
    assert_eq!(metrics.success_rate, 1.0);
    drop(s);

    let s1 = plan_step(&session, "s1");
    assert_eq!(s1.status, StepStatus::Completed);
    assert!(s1.start_time.is_some() && s1.end_time.is_some());
    assert_eq!(s1.rollback_data, Some(json!({"path": "a.txt", "previous": null})));
}

#[tokio::test]
async fn unsupported_action_fails_before_any_step_runs() {
    let world = FakeWorld::new();
    let session = session_with(vec![
        create_file_step("s1", "a.txt", "one"),
        step("s2", "teleport", json!({})),
    ]);

    let err = run(&world, &session, true).await.unwrap_err();

    match err {
        OrchestratorError::UnsupportedAction { step, action } => {
            assert_eq!(step, "s2");
            assert_eq!(action, "teleport");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(world.files.calls().is_empty());
    assert_eq!(plan_step(&session, "s1").status, StepStatus::Pending);
}

#[tokio::test]
async fn retryable_failure_is_retried_until_success() {
    let world = FakeWorld::new();
    world.files.fail_next(1);
    let session = session_with(vec![create_file_step("s1", "a.txt", "one").with_max_retries(2)]);

    let outcome = run(&world, &session, true).await.unwrap();

    assert!(outcome.results.contains_key("s1"));
    let s1 = plan_step(&session, "s1");
    assert_eq!(s1.status, StepStatus::Completed);
    assert_eq!(s1.retry_count, 1);
    assert_eq!(s1.error, None);

    let s = session.lock();
    assert_eq!(s.tool_states[&StepId::new("s1")].attempts, 2);
    let metrics = s.metrics.get("create_file").unwrap();
    assert_eq!(metrics.total_executions, 2);
    assert_eq!(metrics.success_rate, 0.5);
}

#[tokio::test]
async fn exhausted_retries_stop_execution_for_rollback() {
    let world = FakeWorld::new();
    world.files.fail_next(10);
    let session = session_with(vec![
        create_file_step("s1", "a.txt", "one").with_max_retries(1),
        create_file_step("s2", "b.txt", "two"),
    ]);

    let outcome = run(&world, &session, true).await.unwrap();

    assert_eq!(outcome.failed, [StepId::new("s1")]);
    assert_eq!(outcome.rollback_required, Some(StepId::new("s1")));
    assert_eq!(outcome.skipped, [StepId::new("s2")]);

    let s1 = plan_step(&session, "s1");
    assert_eq!(s1.status, StepStatus::Failed);
    assert_eq!(s1.retry_count, 1);
    assert!(s1.error.as_deref().unwrap_or_default().contains("injected failure"));
    assert_eq!(plan_step(&session, "s2").status, StepStatus::Cancelled);
    assert_eq!(session.lock().metrics.get("create_file").unwrap().total_executions, 2);
}

#[tokio::test]
async fn without_auto_retry_a_failure_is_final_and_dependents_are_skipped() {
    let world = FakeWorld::new();
    world.files.fail_next(1);
    let session = session_with(vec![
        create_file_step("s1", "a.txt", "one").with_max_retries(2),
        create_file_step("s2", "b.txt", "two").depends_on("s1"),
        create_file_step("s3", "c.txt", "three"),
    ]);

    let outcome = run(&world, &session, false).await.unwrap();

    assert_eq!(outcome.failed, [StepId::new("s1")]);
    assert_eq!(outcome.rollback_required, None);
    assert_eq!(outcome.skipped, [StepId::new("s2")]);
    assert!(outcome.results.contains_key("s3"));

    let s1 = plan_step(&session, "s1");
    assert_eq!(s1.retry_count, 0);
    let s2 = plan_step(&session, "s2");
    assert_eq!(s2.status, StepStatus::Cancelled);
    assert_eq!(s2.error.as_deref(), Some("dependency s1 failed"));
    assert!(!session.lock().tool_states.contains_key("s2"));
}

#[tokio::test]
async fn fatal_failure_is_not_retried() {
    let world = FakeWorld::new();
    world.validator.deny("rm -rf /");
    let session = session_with(vec![command_step("s1", "rm -rf /").with_max_retries(3)]);

    let outcome = run(&world, &session, true).await.unwrap();

    assert_eq!(outcome.failed, [StepId::new("s1")]);
    // retry budget left, so no rollback
    assert_eq!(outcome.rollback_required, None);
    assert_eq!(plan_step(&session, "s1").retry_count, 0);
    assert!(world.runner.calls().is_empty());
}

#[tokio::test]
async fn cancelled_session_skips_remaining_steps() {
    let world = FakeWorld::new();
    let session = session_with(vec![
        create_file_step("s1", "a.txt", "one"),
        create_file_step("s2", "b.txt", "two"),
    ]);
    session.lock().state = OrchestratorState::Cancelled;

    let outcome = run(&world, &session, true).await.unwrap();

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.skipped, [StepId::new("s1"), StepId::new("s2")]);
    assert!(world.files.calls().is_empty());
    assert_eq!(
        plan_step(&session, "s2").error.as_deref(),
        Some("workflow cancelled")
    );
}

#[tokio::test]
async fn unavailable_context_falls_back_to_session_snapshot() {
    let world = FakeWorld::new();
    world.context.set_error("editor closed");
    let session = session_with(vec![create_file_step("s1", "a.txt", "one")]);

    run(&world, &session, true).await.unwrap();

    let s = session.lock();
    assert_eq!(
        s.tool_states[&StepId::new("s1")].context.as_value(),
        &json!({"from": "session"})
    );
}

#[tokio::test]
async fn successful_step_resets_consecutive_errors() {
    let world = FakeWorld::new();
    let session = session_with(vec![create_file_step("s1", "a.txt", "one")]);
    session.lock().consecutive_errors = 2;

    run(&world, &session, true).await.unwrap();

    assert_eq!(session.lock().consecutive_errors, 0);
}

mod ordering {
    use super::*;
    use proptest::prelude::*;
    use proptest::sample::Index;

    /// Step `i` may depend on any step before it; listed newest first.
    fn dag(picks: &[Vec<Index>]) -> Vec<WorkflowStep> {
        let mut steps: Vec<WorkflowStep> = picks
            .iter()
            .enumerate()
            .map(|(i, deps)| {
                let mut step = step(&format!("s{i}"), "ai_generate", json!({}));
                if i > 0 {
                    for dep in deps {
                        let id = StepId::new(format!("s{}", dep.index(i)));
                        if !step.dependencies.contains(&id) {
                            step.dependencies.push(id);
                        }
                    }
                }
                step
            })
            .collect();
        steps.reverse();
        steps
    }

    proptest! {
        #[test]
        fn dependencies_always_run_first(
            picks in prop::collection::vec(prop::collection::vec(any::<Index>(), 0..3), 1..10)
        ) {
            let steps = dag(&picks);
            let order = execution_order(&steps).unwrap();
            prop_assert_eq!(order.len(), steps.len());

            let position = |id: &StepId| {
                order.iter().position(|&i| &steps[i].id == id).unwrap()
            };
            for step in &steps {
                for dep in &step.dependencies {
                    prop_assert!(position(dep) < position(&step.id));
                }
            }
        }
    }
}
