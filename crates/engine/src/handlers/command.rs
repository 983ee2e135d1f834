// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell command step handler.

use super::{str_param, Collaborators, StepError, StepHandler, StepOutput};
use async_trait::async_trait;
use pilot_core::WorkflowStep;
use serde_json::json;
use std::path::Path;

/// Handles `execute_command`: validate, then run in the workspace.
///
/// An optional `cwd` parameter is resolved against the workspace root.
/// A non-zero exit is a retryable failure carrying stderr.
pub struct ExecuteCommandHandler;

#[async_trait]
impl StepHandler for ExecuteCommandHandler {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError> {
        let command = str_param(step, &["command", "cmd"])
            .ok_or_else(|| StepError::missing_param(step, "command"))?;

        if !collaborators.validator.validate_command(command).await? {
            return Err(StepError::fatal(format!("command rejected: {command}")));
        }

        let cwd = match step.param_str("cwd") {
            Some(dir) if Path::new(dir).is_absolute() || dir.split('/').any(|c| c == "..") => {
                return Err(StepError::fatal(format!(
                    "cwd must stay inside the workspace: {dir}"
                )));
            }
            Some(dir) => collaborators.workspace_root.join(dir),
            None => collaborators.workspace_root.clone(),
        };

        let output = collaborators.runner.run(command, &cwd).await?;
        if !output.success() {
            let stderr = output.stderr.trim();
            return Err(StepError::retryable(format!(
                "command exited with {}: {}",
                output
                    .exit_code
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                if stderr.is_empty() { "(no stderr)" } else { stderr }
            )));
        }

        Ok(StepOutput::new(json!({
            "command": command,
            "exitCode": output.exit_code,
            "stdout": output.stdout,
            "stderr": output.stderr,
        })))
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
