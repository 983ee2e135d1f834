// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pilot-core: data model and state contract for the pilot workflow orchestrator

pub mod action;
pub mod checkpoint;
pub mod clock;
pub mod context;
pub mod id;
pub mod metrics;
pub mod plan;
pub mod record;
pub mod state;
pub mod transition;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use checkpoint::{ApprovalInfo, Checkpoint, FileChange, FileChangeKind, ToolExecutionState};
pub use clock::{Clock, FakeClock, SystemClock};
pub use context::ContextSnapshot;
pub use id::{CheckpointId, IdGen, PlanId, SequentialIdGen, SessionId, StepId, UuidIdGen};
pub use metrics::{ToolMetrics, ToolMetricsStore};
pub use plan::{Complexity, Level, PlanStatus, RiskLevel, StepStatus, WorkflowPlan, WorkflowStep};
pub use record::{ErrorRecord, StateTransitionRecord};
pub use state::OrchestratorState;
pub use transition::{TableError, TransitionError, TransitionTable};
