// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::files::{FileError, FileMutator};
use crate::gateway::{AiGateway, GatewayError};
use crate::tools::{ToolError, ToolInvoker};
use async_trait::async_trait;
use pilot_core::ContextSnapshot;
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any AiGateway
#[derive(Clone)]
pub struct TracedGateway<G> {
    inner: G,
}

impl<G> TracedGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: AiGateway> AiGateway for TracedGateway<G> {
    async fn send_message(
        &self,
        prompt: &str,
        context: &ContextSnapshot,
    ) -> Result<String, GatewayError> {
        async {
            tracing::info!(prompt_len = prompt.len(), "sending");
            let start = Instant::now();
            let result = self.inner.send_message(prompt, context).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(reply) => tracing::info!(reply_len = reply.len(), elapsed_ms, "reply received"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "send failed"),
            }
            result
        }
        .instrument(tracing::info_span!("gateway.send"))
        .await
    }
}

/// Wrapper that adds tracing to any FileMutator
#[derive(Clone)]
pub struct TracedFiles<F> {
    inner: F,
}

impl<F> TracedFiles<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

fn log_file_result(op: &str, path: &str, result: &Result<(), FileError>) {
    tracing::info_span!("files", op, path).in_scope(|| match result {
        Ok(()) => tracing::info!("applied"),
        Err(e) => tracing::error!(error = %e, "failed"),
    });
}

#[async_trait]
impl<F: FileMutator> FileMutator for TracedFiles<F> {
    async fn create_file(&self, path: &str, content: &str) -> Result<(), FileError> {
        let result = self.inner.create_file(path, content).await;
        log_file_result("create", path, &result);
        result
    }

    async fn modify_file(&self, path: &str, content: &str) -> Result<(), FileError> {
        let result = self.inner.modify_file(path, content).await;
        log_file_result("modify", path, &result);
        result
    }

    async fn delete_file(&self, path: &str) -> Result<(), FileError> {
        let result = self.inner.delete_file(path).await;
        log_file_result("delete", path, &result);
        result
    }

    async fn read_file(&self, path: &str) -> Result<Option<String>, FileError> {
        let result = self.inner.read_file(path).await;
        tracing::trace!(path, found = ?result.as_ref().ok().map(Option::is_some), "read");
        result
    }
}

/// Wrapper that adds tracing to any CommandRunner
#[derive(Clone)]
pub struct TracedCommandRunner<R> {
    inner: R,
}

impl<R> TracedCommandRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: CommandRunner> CommandRunner for TracedCommandRunner<R> {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput, CommandError> {
        async {
            tracing::info!(command, "starting");
            let start = Instant::now();
            let result = self.inner.run(command, cwd).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(output) => tracing::info!(exit_code = ?output.exit_code, elapsed_ms, "finished"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "run failed"),
            }
            result
        }
        .instrument(tracing::info_span!("command.run", cwd = %cwd.display()))
        .await
    }
}

/// Wrapper that adds tracing to any ToolInvoker
#[derive(Clone)]
pub struct TracedTools<T> {
    inner: T,
}

impl<T> TracedTools<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: ToolInvoker> ToolInvoker for TracedTools<T> {
    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        async {
            let start = Instant::now();
            let result = self.inner.call_tool(name, args).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "tool returned"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "tool failed"),
            }
            result
        }
        .instrument(tracing::info_span!("tools.call", name))
        .await
    }

    async fn read_resource(&self, server: &str, uri: &str) -> Result<Value, ToolError> {
        let result = self.inner.read_resource(server, uri).await;
        if let Err(ref e) = result {
            tracing::error!(server, uri, error = %e, "read_resource failed");
        }
        result
    }

    async fn documentation(&self, topic: &str) -> Result<String, ToolError> {
        let result = self.inner.documentation(topic).await;
        if let Err(ref e) = result {
            tracing::warn!(topic, error = %e, "documentation lookup failed");
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
