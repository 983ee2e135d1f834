// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pilot-engine: the workflow orchestrator
//!
//! Plans a natural-language task through an AI gateway, waits for approval,
//! executes the plan's steps in dependency order through pluggable
//! handlers, and checkpoints the session along the way.

mod checkpoint;
pub mod config;
pub mod env;
mod error;
mod executor;
pub mod handlers;
mod orchestrator;
pub mod planner;
mod recovery;
mod rollback;
mod session;

#[cfg(test)]
mod test_helpers;

pub use checkpoint::{AutosaveHandle, AutosaveTick, AUTOSAVE_NAME};
pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use executor::{execution_order, ExecutionReport};
pub use handlers::{Collaborators, HandlerRegistry, StepError, StepHandler, StepOutput};
pub use orchestrator::{Orchestrator, OrchestratorDeps};
pub use planner::Planner;
pub use recovery::{ErrorRecovery, RecoveryDecision};
