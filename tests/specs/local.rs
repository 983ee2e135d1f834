//! End to end against the real filesystem and shell.

use crate::prelude::*;
use pilot_adapters::FakeAiGateway;
use pilot_core::{FakeClock, OrchestratorState, SequentialIdGen, StepId};
use pilot_engine::{Orchestrator, OrchestratorDeps};
use serde_json::json;
use similar_asserts::assert_eq;

#[tokio::test]
async fn local_collaborators_apply_changes_on_disk() {
    let root = tempfile::tempdir().unwrap();
    let workspace = root.path().join("workspace");
    let state = root.path().join("state");
    std::fs::create_dir_all(&workspace).unwrap();
    std::fs::write(workspace.join("b.txt"), "old").unwrap();

    let config = config()
        .with_workspace_root(&workspace)
        .with_state_dir(&state);
    let gateway = FakeAiGateway::new();
    gateway.push_reply(reply(json!([
        {"id": "a", "action": "create_file", "parameters": {"path": "src/a.txt", "content": "alpha"}},
        {"id": "b", "action": "modify_file", "parameters": {"path": "b.txt", "content": "new"}},
        {"id": "c", "action": "execute_command", "parameters": {"command": "printf done"},
         "dependencies": ["a", "b"]},
    ])));
    let deps = OrchestratorDeps::local(gateway, &config).unwrap();
    let orchestrator =
        Orchestrator::with_clock(deps, config, FakeClock::new(), SequentialIdGen::new("local"));

    orchestrator.start_workflow("local task").await.unwrap();
    orchestrator.approve_plan("reviewer").await.unwrap();
    let report = orchestrator.execute_plan().await.unwrap();

    assert_eq!(report.final_state, OrchestratorState::Completed);
    assert_eq!(std::fs::read_to_string(workspace.join("src/a.txt")).unwrap(), "alpha");
    assert_eq!(std::fs::read_to_string(workspace.join("b.txt")).unwrap(), "new");
    assert_eq!(report.results["c"]["stdout"], json!("done"));
    assert_eq!(orchestrator.file_changes().len(), 2);

    orchestrator.create_checkpoint("local");
    assert!(state.join("checkpoints").join(format!("{SESSION}.json")).exists());
}

#[tokio::test]
async fn denied_commands_never_reach_the_shell() {
    let root = tempfile::tempdir().unwrap();
    let config = config().with_workspace_root(root.path());
    let gateway = FakeAiGateway::new();
    gateway.push_reply(reply(json!([
        {"id": "wipe", "action": "execute_command", "parameters": {"command": "rm -rf /"}},
    ])));
    let deps = OrchestratorDeps::local(gateway, &config).unwrap();
    let orchestrator =
        Orchestrator::with_clock(deps, config, FakeClock::new(), SequentialIdGen::new("local"));

    orchestrator.start_workflow("dangerous").await.unwrap();
    orchestrator.approve_plan("reviewer").await.unwrap();
    let report = orchestrator.execute_plan().await.unwrap();

    assert_eq!(report.final_state, OrchestratorState::Failed);
    assert_eq!(report.failed_steps, vec![StepId::new("wipe")]);
    assert!(!report.rolled_back);
}
