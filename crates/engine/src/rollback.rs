// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reverting completed steps after an unrecoverable failure

use crate::error::OrchestratorError;
use crate::handlers::{Collaborators, HandlerRegistry};
use pilot_core::WorkflowStep;

/// Roll back `completed` (in execution order) newest first.
///
/// Stops at the first handler that cannot revert its step. Returns how
/// many steps were reverted.
pub(crate) async fn revert_steps(
    registry: &HandlerRegistry,
    collaborators: &Collaborators,
    completed: &[WorkflowStep],
) -> Result<usize, OrchestratorError> {
    for step in completed.iter().rev() {
        let handler = registry.get(&step.action).ok_or_else(|| {
            OrchestratorError::UnsupportedAction {
                step: step.id.clone(),
                action: step.action.clone(),
            }
        })?;
        handler
            .rollback(step, step.rollback_data.as_ref(), collaborators)
            .await
            .map_err(|e| OrchestratorError::StepExecution {
                step: step.id.clone(),
                message: format!("rollback failed: {}", e.message),
            })?;
        tracing::info!(step_id = %step.id, action = %step.action, "step rolled back");
    }
    Ok(completed.len())
}

#[cfg(test)]
#[path = "rollback_tests.rs"]
mod tests;
