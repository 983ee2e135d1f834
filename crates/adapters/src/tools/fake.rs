// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake tool invoker for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ToolError, ToolInvoker};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded call to FakeToolInvoker
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Tool { name: String, args: Value },
    Resource { server: String, uri: String },
    Documentation { topic: String },
}

#[derive(Default)]
struct FakeToolState {
    tools: HashMap<String, Value>,
    resources: HashMap<(String, String), Value>,
    docs: HashMap<String, String>,
    /// Remaining failures injected into `call_tool`
    failures: u32,
    calls: Vec<ToolCall>,
}

/// Fake invoker with canned tool results, resources and documentation
#[derive(Clone, Default)]
pub struct FakeToolInvoker {
    inner: Arc<Mutex<FakeToolState>>,
}

impl FakeToolInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tool(&self, name: &str, result: Value) {
        self.inner.lock().tools.insert(name.to_string(), result);
    }

    pub fn set_resource(&self, server: &str, uri: &str, content: Value) {
        self.inner
            .lock()
            .resources
            .insert((server.to_string(), uri.to_string()), content);
    }

    pub fn set_documentation(&self, topic: &str, text: &str) {
        self.inner
            .lock()
            .docs
            .insert(topic.to_string(), text.to_string());
    }

    /// Fail the next `n` tool calls
    pub fn fail_next(&self, n: u32) {
        self.inner.lock().failures = n;
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl ToolInvoker for FakeToolInvoker {
    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ToolCall::Tool {
            name: name.to_string(),
            args,
        });
        if inner.failures > 0 {
            inner.failures -= 1;
            return Err(ToolError::CallFailed(format!("{name}: injected failure")));
        }
        inner
            .tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    async fn read_resource(&self, server: &str, uri: &str) -> Result<Value, ToolError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ToolCall::Resource {
            server: server.to_string(),
            uri: uri.to_string(),
        });
        inner
            .resources
            .get(&(server.to_string(), uri.to_string()))
            .cloned()
            .ok_or_else(|| ToolError::CallFailed(format!("resource not found: {server} {uri}")))
    }

    async fn documentation(&self, topic: &str) -> Result<String, ToolError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ToolCall::Documentation {
            topic: topic.to_string(),
        });
        inner
            .docs
            .get(topic)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(topic.to_string()))
    }
}
