//! Test harness for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use pilot_adapters::{
    FakeAiGateway, FakeCommandRunner, FakeCommandValidator, FakeContextProvider, FakeFileMutator,
};
use pilot_core::test_support::plan_response;
use pilot_core::{FakeClock, OrchestratorState, SequentialIdGen, WorkflowPlan};
use pilot_engine::{Collaborators, ExecutionReport, Orchestrator, OrchestratorConfig, OrchestratorDeps};
use pilot_storage::CheckpointStore;
use serde_json::{json, Value};
use std::sync::Arc;

pub type SpecOrchestrator = Orchestrator<FakeClock, SequentialIdGen>;

pub const SESSION: &str = "spec-session";

/// An orchestrator wired to fakes, plus handles on the fakes
pub struct Harness {
    pub orchestrator: SpecOrchestrator,
    pub gateway: FakeAiGateway,
    pub files: FakeFileMutator,
    pub runner: FakeCommandRunner,
    pub validator: FakeCommandValidator,
    pub context: FakeContextProvider,
    pub clock: FakeClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(config(), None)
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self::build(config, None)
    }

    pub fn with_store(store: Arc<dyn CheckpointStore>) -> Self {
        Self::build(config(), Some(store))
    }

    fn build(config: OrchestratorConfig, store: Option<Arc<dyn CheckpointStore>>) -> Self {
        let gateway = FakeAiGateway::new();
        let files = FakeFileMutator::new();
        let runner = FakeCommandRunner::new();
        let validator = FakeCommandValidator::new();
        let context = FakeContextProvider::with_value(json!({"workspace": "spec"}));
        let clock = FakeClock::new();
        let collaborators = Collaborators::new(
            Arc::new(context.clone()),
            Arc::new(gateway.clone()),
            Arc::new(files.clone()),
            Arc::new(validator.clone()),
            Arc::new(runner.clone()),
            "/spec",
        );
        let mut deps = OrchestratorDeps::new(collaborators);
        if let Some(store) = store {
            deps = deps.with_store(store);
        }
        let orchestrator =
            Orchestrator::with_clock(deps, config, clock.clone(), SequentialIdGen::new("spec"));
        Self {
            orchestrator,
            gateway,
            files,
            runner,
            validator,
            context,
            clock,
        }
    }

    /// Plan `steps` and stop at PENDING_APPROVAL.
    pub async fn plan(&self, steps: Value) -> WorkflowPlan {
        self.gateway.push_reply(reply(steps));
        let plan = self.orchestrator.start_workflow("spec task").await.unwrap();
        assert_eq!(self.orchestrator.current_state(), OrchestratorState::PendingApproval);
        plan
    }

    /// Plan, approve and execute `steps`.
    pub async fn run(&self, steps: Value) -> ExecutionReport {
        self.plan(steps).await;
        self.orchestrator.approve_plan("reviewer").await.unwrap();
        self.orchestrator.execute_plan().await.unwrap()
    }

    pub fn targets(&self) -> Vec<OrchestratorState> {
        self.orchestrator
            .state_history()
            .iter()
            .map(|r| r.target)
            .collect()
    }
}

pub fn config() -> OrchestratorConfig {
    OrchestratorConfig::default().with_session_id(SESSION)
}

/// Planner reply for `steps`
pub fn reply(steps: Value) -> String {
    plan_response("spec task", "low", steps)
}

/// A plan with one side-effect-free step
pub fn trivial_steps() -> Value {
    json!([{"id": "only", "action": "ai_generate", "parameters": {"prompt": "hello"}}])
}
