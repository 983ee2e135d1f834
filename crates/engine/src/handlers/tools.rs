// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External tool server step handlers.

use super::{str_param, Collaborators, StepError, StepHandler, StepOutput};
use async_trait::async_trait;
use pilot_core::WorkflowStep;
use serde_json::{json, Value};

/// Handles `mcp_tool` and `use_mcp_tool`.
pub struct McpToolHandler;

#[async_trait]
impl StepHandler for McpToolHandler {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError> {
        let name = str_param(step, &["toolName", "tool_name", "tool"])
            .ok_or_else(|| StepError::missing_param(step, "toolName"))?;
        let args = step
            .param("arguments")
            .or_else(|| step.param("args"))
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        let result = collaborators.tools.call_tool(name, args).await?;
        Ok(StepOutput::new(json!({ "tool": name, "result": result })))
    }
}

/// Handles `access_mcp_resource`.
pub struct AccessResourceHandler;

#[async_trait]
impl StepHandler for AccessResourceHandler {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError> {
        let server = str_param(step, &["serverName", "server_name", "server"])
            .ok_or_else(|| StepError::missing_param(step, "serverName"))?;
        let uri = str_param(step, &["uri"]).ok_or_else(|| StepError::missing_param(step, "uri"))?;
        let content = collaborators.tools.read_resource(server, uri).await?;
        Ok(StepOutput::new(
            json!({ "server": server, "uri": uri, "content": content }),
        ))
    }
}

/// Handles `load_mcp_documentation`.
pub struct LoadDocumentationHandler;

#[async_trait]
impl StepHandler for LoadDocumentationHandler {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError> {
        let topic = str_param(step, &["topic", "serverName", "server_name"])
            .ok_or_else(|| StepError::missing_param(step, "topic"))?;
        let text = collaborators.tools.documentation(topic).await?;
        Ok(StepOutput::new(json!({ "topic": topic, "documentation": text })))
    }
}

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
