//! Error recovery and the consecutive-error threshold.

use crate::prelude::*;
use pilot_adapters::GatewayError;
use pilot_core::OrchestratorState::*;
use pilot_engine::OrchestratorError;

async fn failed_planning(h: &Harness) -> OrchestratorError {
    h.gateway.push_error(GatewayError::RequestFailed("upstream 502".into()));
    h.orchestrator.start_workflow("spec task").await.unwrap_err()
}

#[tokio::test]
async fn three_consecutive_errors_terminate_in_failed() {
    let h = Harness::new();

    for expected in [Idle, Idle, Failed] {
        let err = failed_planning(&h).await;
        assert!(matches!(err, OrchestratorError::PlanningFailed(_)), "{err}");
        assert_eq!(h.orchestrator.current_state(), expected);
    }

    assert_eq!(h.orchestrator.consecutive_errors(), 3);
    assert_eq!(h.orchestrator.error_history().len(), 3);
    let recoveries = h.targets().iter().filter(|t| **t == ErrorRecovery).count();
    assert_eq!(recoveries, 3);
}

#[tokio::test]
async fn a_successful_workflow_clears_the_error_count() {
    let h = Harness::new();
    for _ in 0..3 {
        failed_planning(&h).await;
    }
    assert_eq!(h.orchestrator.current_state(), Failed);

    h.gateway.set_fallback("generated");
    let report = h.run(trivial_steps()).await;
    assert_eq!(report.final_state, Completed);
    assert_eq!(h.orchestrator.consecutive_errors(), 0);

    // a fourth error starts counting from zero
    h.gateway.push_error(GatewayError::EmptyResponse);
    h.orchestrator.start_workflow("spec task").await.unwrap_err();
    assert_eq!(h.orchestrator.consecutive_errors(), 1);
    assert_eq!(h.orchestrator.current_state(), Idle);
}

#[tokio::test]
async fn threshold_is_configurable() {
    let mut config = config();
    config.max_consecutive_errors = 1;
    let h = Harness::with_config(config);

    failed_planning(&h).await;

    assert_eq!(h.orchestrator.current_state(), Failed);
}

#[tokio::test]
async fn unparsable_plan_is_a_planning_failure() {
    let h = Harness::new();
    h.gateway.push_reply("I would rather not.");

    let err = h.orchestrator.start_workflow("spec task").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::PlanningFailed(_)), "{err}");
    assert_eq!(h.orchestrator.current_plan(), None);
    let errors = h.orchestrator.error_history();
    assert_eq!(errors[0].state, Planning);
}
