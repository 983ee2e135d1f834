//! Checkpoint creation, restore and durability.

use crate::prelude::*;
use pilot_core::OrchestratorState;
use serde_json::json;
use similar_asserts::assert_eq;

#[tokio::test]
async fn restore_brings_back_the_snapshot_and_keeps_the_list() {
    let h = Harness::new();
    h.gateway.set_fallback("generated");
    h.run(trivial_steps()).await;
    let saved = h.orchestrator.create_checkpoint("after first run");

    h.run(json!([
        {"id": "x", "action": "create_file", "parameters": {"path": "x.txt", "content": "x"}},
    ]))
    .await;
    assert_ne!(h.orchestrator.tool_execution_states(), saved.tool_states);
    let count = h.orchestrator.checkpoints().len();

    h.orchestrator.restore_checkpoint(saved.id.as_str()).await.unwrap();

    assert_eq!(h.orchestrator.current_state(), saved.state);
    assert_eq!(h.orchestrator.tool_execution_states(), saved.tool_states);
    assert_eq!(h.orchestrator.current_plan(), saved.plan);
    assert_eq!(h.orchestrator.file_changes(), saved.file_changes);
    assert_eq!(h.orchestrator.checkpoints().len(), count);
}

#[tokio::test]
async fn consecutive_checkpoints_capture_identical_contents() {
    let h = Harness::new();
    h.plan(trivial_steps()).await;

    let first = h.orchestrator.create_checkpoint("pending");
    let second = h.orchestrator.create_checkpoint("pending");

    assert_ne!(first.id, second.id);
    assert_ne!(first.timestamp, second.timestamp);
    assert!(first.same_contents(&second));
    assert_eq!(first.state, OrchestratorState::PendingApproval);
    assert_eq!(h.orchestrator.current_state(), OrchestratorState::PendingApproval);
}

#[tokio::test]
async fn checkpoints_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = || config().with_state_dir(dir.path());

    let first = Harness::with_config(config());
    first.gateway.set_fallback("generated");
    first.run(trivial_steps()).await;
    first.orchestrator.create_checkpoint("one");
    first.orchestrator.create_checkpoint("two");
    let saved = first.orchestrator.checkpoints();
    assert!(dir.path().join("checkpoints").join(format!("{SESSION}.json")).exists());

    let second = Harness::with_config(config());
    second.gateway.set_fallback("generated");
    assert!(second.orchestrator.checkpoints().is_empty());
    second.plan(trivial_steps()).await;

    assert_eq!(second.orchestrator.checkpoints(), saved);
    assert_eq!(second.targets()[0], OrchestratorState::Initializing);

    // the loaded list is usable
    second.orchestrator.approve_plan("reviewer").await.unwrap();
    second.orchestrator.execute_plan().await.unwrap();
    second
        .orchestrator
        .restore_checkpoint(saved[0].id.as_str())
        .await
        .unwrap();
    assert_eq!(second.orchestrator.current_state(), OrchestratorState::Completed);
    assert_eq!(second.orchestrator.current_plan(), saved[0].plan);
}
