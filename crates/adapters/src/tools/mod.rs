// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External tool server adapters

mod noop;

pub use noop::NoOpToolInvoker;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeToolInvoker, ToolCall};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from tool operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("no tool server configured")]
    Unavailable,
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool call failed: {0}")]
    CallFailed(String),
}

/// Invokes tools and reads resources exposed by external tool servers
#[async_trait]
pub trait ToolInvoker: Send + Sync + 'static {
    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError>;

    async fn read_resource(&self, server: &str, uri: &str) -> Result<Value, ToolError>;

    /// Human-readable documentation for a topic (a server or tool name)
    async fn documentation(&self, topic: &str) -> Result<String, ToolError>;
}
