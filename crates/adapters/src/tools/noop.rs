// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool invoker used when no tool server is configured.

use super::{ToolError, ToolInvoker};
use async_trait::async_trait;
use serde_json::Value;

/// Fails every call with `ToolError::Unavailable`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpToolInvoker;

impl NoOpToolInvoker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolInvoker for NoOpToolInvoker {
    async fn call_tool(&self, _name: &str, _args: Value) -> Result<Value, ToolError> {
        Err(ToolError::Unavailable)
    }

    async fn read_resource(&self, _server: &str, _uri: &str) -> Result<Value, ToolError> {
        Err(ToolError::Unavailable)
    }

    async fn documentation(&self, _topic: &str) -> Result<String, ToolError> {
        Err(ToolError::Unavailable)
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
