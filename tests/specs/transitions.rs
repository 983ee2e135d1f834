//! Transition table enforcement through the public API.

use crate::prelude::*;
use pilot_core::{OrchestratorState, TransitionTable};
use pilot_engine::OrchestratorError;

async fn check_rejections(h: &Harness, from: OrchestratorState) {
    let table = TransitionTable::standard();
    for to in OrchestratorState::ALL {
        if table.is_allowed(from, to) {
            continue;
        }
        let before = h.orchestrator.state_history();
        let err = h.orchestrator.transition(to, Some("probe"), None).await.unwrap_err();
        assert!(
            matches!(err, OrchestratorError::InvalidTransition { from: f, to: t } if f == from && t == to),
            "{from} -> {to}: {err}"
        );
        assert_eq!(h.orchestrator.state_history(), before, "{from} -> {to}");
        assert_eq!(h.orchestrator.current_state(), from);
    }
}

#[tokio::test]
async fn illegal_targets_from_idle_are_rejected_without_history() {
    let h = Harness::new();
    check_rejections(&h, OrchestratorState::Idle).await;
}

#[tokio::test]
async fn illegal_targets_from_pending_approval_are_rejected_without_history() {
    let h = Harness::new();
    h.plan(trivial_steps()).await;
    check_rejections(&h, OrchestratorState::PendingApproval).await;
}

#[tokio::test]
async fn illegal_targets_from_completed_are_rejected_without_history() {
    let h = Harness::new();
    h.gateway.set_fallback("generated");
    h.run(trivial_steps()).await;
    check_rejections(&h, OrchestratorState::Completed).await;
}

#[tokio::test]
async fn every_legal_edge_from_idle_appends_its_record_first() {
    let table = TransitionTable::standard();
    for to in table.targets(OrchestratorState::Idle) {
        let h = Harness::new();
        // entry actions may fail and recover; the first record is still ours
        let _ = h.orchestrator.transition(to, Some("probe"), None).await;

        let history = h.orchestrator.state_history();
        assert_eq!(history[0].from, OrchestratorState::Idle);
        assert_eq!(history[0].target, to);
        assert_eq!(history[0].reason.as_deref(), Some("probe"));
    }
}

#[tokio::test]
async fn history_forms_an_unbroken_chain() {
    let h = Harness::new();
    h.gateway.set_fallback("generated");
    h.files.insert("b.txt", "x");

    h.run(serde_json::json!([
        {"id": "a", "action": "create_file", "parameters": {"path": "a.txt", "content": "1"}},
        {"id": "b", "action": "delete_file", "parameters": {"path": "b.txt"}, "dependencies": ["a"]},
    ]))
    .await;
    h.orchestrator.cancel_workflow().unwrap_err();
    h.run(trivial_steps()).await;

    let history = h.orchestrator.state_history();
    assert_eq!(history[0].from, OrchestratorState::Idle);
    for pair in history.windows(2) {
        assert_eq!(pair[1].from, pair[0].target, "{pair:?}");
    }
    assert_eq!(
        history.last().map(|r| r.target),
        Some(h.orchestrator.current_state())
    );
}
