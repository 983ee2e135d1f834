// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the orchestrator

use pilot_core::{OrchestratorState, PlanStatus, StepId, TransitionError};
use pilot_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by orchestrator operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: OrchestratorState,
        to: OrchestratorState,
    },
    #[error("planning failed: {0}")]
    PlanningFailed(String),
    #[error("cyclic dependency involving step {0}")]
    CyclicDependency(StepId),
    #[error("unsupported action {action:?} in step {step}")]
    UnsupportedAction { step: StepId, action: String },
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("step {step} failed: {message}")]
    StepExecution { step: StepId, message: String },
    #[error("checkpoint not found: {0}")]
    CheckpointNotFound(String),
    #[error("plan is not approved (status: {status})")]
    PlanNotApproved { status: PlanStatus },
    #[error("no active plan")]
    NoActivePlan,
    #[error("workflow cancelled before its plan was ready")]
    Cancelled,
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<TransitionError> for OrchestratorError {
    fn from(e: TransitionError) -> Self {
        OrchestratorError::InvalidTransition {
            from: e.from,
            to: e.to,
        }
    }
}
