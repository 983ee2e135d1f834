// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::plan::WorkflowStep;
use serde_json::json;

fn sample() -> Checkpoint {
    let mut tool_states = BTreeMap::new();
    tool_states.insert(
        StepId::new("s1"),
        ToolExecutionState {
            step_id: StepId::new("s1"),
            action: "create_file".to_string(),
            parameters: json!({"path": "a.txt"}),
            status: StepStatus::Completed,
            context: ContextSnapshot::new(json!({"open": ["a.txt"]})),
            approval: Some(ApprovalInfo {
                approved_by: "alice".to_string(),
                approved_at: 10,
            }),
            start_time: 100,
            end_time: Some(130),
            attempts: 1,
            result: Some(json!({"path": "a.txt"})),
            error: None,
        },
    );
    Checkpoint {
        id: CheckpointId::new("cp-1"),
        name: "Manual".to_string(),
        description: String::new(),
        timestamp: 200,
        state: OrchestratorState::Executing,
        context: ContextSnapshot::default(),
        tool_states,
        plan: Some(WorkflowPlan::new(
            "p",
            "t",
            vec![WorkflowStep::new("s1", "create_file", json!({"path": "a.txt"}))],
        )),
        file_changes: vec![FileChange {
            path: "a.txt".to_string(),
            kind: FileChangeKind::Created,
            step_id: Some(StepId::new("s1")),
            timestamp: 130,
        }],
    }
}

#[test]
fn json_round_trip() {
    let cp = sample();
    let text = serde_json::to_string(&cp).unwrap();
    let back: Checkpoint = serde_json::from_str(&text).unwrap();
    assert_eq!(back, cp);
}

#[test]
fn json_field_names() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["state"], "EXECUTING");
    assert_eq!(json["toolStates"]["s1"]["approval"]["approvedBy"], "alice");
    assert_eq!(json["fileChanges"][0]["kind"], "created");
    assert_eq!(json["fileChanges"][0]["stepId"], "s1");
}

#[test]
fn same_contents_ignores_id_and_timestamp() {
    let a = sample();
    let mut b = sample();
    b.id = CheckpointId::new("cp-2");
    b.timestamp = 999;
    assert!(a.same_contents(&b));

    b.state = OrchestratorState::Failed;
    assert!(!a.same_contents(&b));
}

#[test]
fn duration_from_timing() {
    let cp = sample();
    assert_eq!(cp.tool_states["s1"].duration_ms(), Some(30));
}
