// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step handlers and the registry that maps action names to them

mod ai;
mod command;
mod files;
mod tools;

pub use ai::AiGenerateHandler;
pub use command::ExecuteCommandHandler;
pub use files::{CreateFileHandler, DeleteFileHandler, ModifyFileHandler};
pub use tools::{AccessResourceHandler, LoadDocumentationHandler, McpToolHandler};

use async_trait::async_trait;
use pilot_adapters::{
    AiGateway, CommandError, CommandRunner, CommandValidator, ContextProvider, FileError,
    FileMutator, GatewayError, NoOpToolInvoker, ToolError, ToolInvoker,
};
use pilot_core::{action, FileChangeKind, WorkflowStep};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Capabilities a step handler may use
#[derive(Clone)]
pub struct Collaborators {
    pub context: Arc<dyn ContextProvider>,
    pub gateway: Arc<dyn AiGateway>,
    pub files: Arc<dyn FileMutator>,
    pub validator: Arc<dyn CommandValidator>,
    pub runner: Arc<dyn CommandRunner>,
    pub tools: Arc<dyn ToolInvoker>,
    /// Working directory for commands
    pub workspace_root: PathBuf,
}

impl Collaborators {
    pub fn new(
        context: Arc<dyn ContextProvider>,
        gateway: Arc<dyn AiGateway>,
        files: Arc<dyn FileMutator>,
        validator: Arc<dyn CommandValidator>,
        runner: Arc<dyn CommandRunner>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            context,
            gateway,
            files,
            validator,
            runner,
            tools: Arc::new(NoOpToolInvoker),
            workspace_root: workspace_root.into(),
        }
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolInvoker>) -> Self {
        self.tools = tools;
        self
    }
}

/// A failed handler invocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StepError {
    pub message: String,
    /// Whether running the handler again could succeed
    pub retryable: bool,
}

impl StepError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    /// A required parameter is missing or has the wrong type.
    pub fn missing_param(step: &WorkflowStep, name: &str) -> Self {
        Self::fatal(format!(
            "step {} ({}) is missing string parameter {name:?}",
            step.id, step.action
        ))
    }
}

impl From<FileError> for StepError {
    fn from(e: FileError) -> Self {
        match e {
            FileError::InvalidPath(_) => StepError::fatal(e.to_string()),
            FileError::NotFound(_) | FileError::Io { .. } => StepError::retryable(e.to_string()),
        }
    }
}

impl From<CommandError> for StepError {
    fn from(e: CommandError) -> Self {
        if e.is_retryable() {
            StepError::retryable(e.to_string())
        } else {
            StepError::fatal(e.to_string())
        }
    }
}

impl From<GatewayError> for StepError {
    fn from(e: GatewayError) -> Self {
        StepError::retryable(e.to_string())
    }
}

impl From<ToolError> for StepError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::CallFailed(_) => StepError::retryable(e.to_string()),
            ToolError::Unavailable | ToolError::UnknownTool(_) => StepError::fatal(e.to_string()),
        }
    }
}

/// What a successful handler invocation produced
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub result: Value,
    /// Whatever `rollback` needs to revert the step
    pub rollback_data: Option<Value>,
    /// Workspace file the step touched
    pub file_change: Option<(String, FileChangeKind)>,
}

impl StepOutput {
    pub fn new(result: Value) -> Self {
        Self {
            result,
            rollback_data: None,
            file_change: None,
        }
    }

    pub fn with_rollback(mut self, data: Value) -> Self {
        self.rollback_data = Some(data);
        self
    }

    pub fn with_file_change(mut self, path: impl Into<String>, kind: FileChangeKind) -> Self {
        self.file_change = Some((path.into(), kind));
        self
    }
}

/// Executes one kind of step action
#[async_trait]
pub trait StepHandler: Send + Sync + 'static {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError>;

    /// Revert a completed step. Actions without side effects keep the default.
    async fn rollback(
        &self,
        _step: &WorkflowStep,
        _rollback_data: Option<&Value>,
        _collaborators: &Collaborators,
    ) -> Result<(), StepError> {
        Ok(())
    }
}

/// Action name to handler
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn StepHandler>>,
}

impl HandlerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry serving every built-in action
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(action::CREATE_FILE, CreateFileHandler);
        registry.register(action::MODIFY_FILE, ModifyFileHandler);
        registry.register(action::DELETE_FILE, DeleteFileHandler);
        registry.register(action::EXECUTE_COMMAND, ExecuteCommandHandler);
        registry.register(action::AI_GENERATE, AiGenerateHandler);
        registry.register(action::MCP_TOOL, McpToolHandler);
        registry.register(action::USE_MCP_TOOL, McpToolHandler);
        registry.register(action::ACCESS_MCP_RESOURCE, AccessResourceHandler);
        registry.register(action::LOAD_MCP_DOCUMENTATION, LoadDocumentationHandler);
        registry
    }

    /// Add or replace the handler for `action`
    pub fn register(&mut self, action: impl Into<String>, handler: impl StepHandler) {
        self.handlers.insert(action.into(), Arc::new(handler));
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn StepHandler>> {
        self.handlers.get(action).cloned()
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Registered action names in sorted order
    pub fn actions(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

/// First string parameter found under any of `names`.
pub(crate) fn str_param<'a>(step: &'a WorkflowStep, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| step.param_str(name))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
