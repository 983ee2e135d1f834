// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI generation step handler.

use super::{str_param, Collaborators, StepError, StepHandler, StepOutput};
use async_trait::async_trait;
use pilot_core::{ContextSnapshot, WorkflowStep};
use serde_json::json;

/// Handles `ai_generate`: sends `prompt` with the current context.
pub struct AiGenerateHandler;

#[async_trait]
impl StepHandler for AiGenerateHandler {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError> {
        let prompt = str_param(step, &["prompt", "instruction"])
            .ok_or_else(|| StepError::missing_param(step, "prompt"))?;
        let context = match collaborators.context.current_context().await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(step_id = %step.id, error = %e, "context unavailable, sending without it");
                ContextSnapshot::default()
            }
        };
        let content = collaborators.gateway.send_message(prompt, &context).await?;
        Ok(StepOutput::new(json!({ "content": content })))
    }
}

#[cfg(test)]
#[path = "ai_tests.rs"]
mod tests;
