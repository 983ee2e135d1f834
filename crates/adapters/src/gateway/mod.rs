// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI gateway adapters

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAiGateway, GatewayCall};

use async_trait::async_trait;
use pilot_core::ContextSnapshot;
use thiserror::Error;

/// Errors from gateway operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    RequestFailed(String),
    #[error("gateway rate limited")]
    RateLimited,
    #[error("gateway returned an empty response")]
    EmptyResponse,
}

/// Sends prompts to a language model.
///
/// The provider wire format is the implementor's concern; the orchestrator
/// only sees prompt text in and reply text out.
#[async_trait]
pub trait AiGateway: Send + Sync + 'static {
    async fn send_message(
        &self,
        prompt: &str,
        context: &ContextSnapshot,
    ) -> Result<String, GatewayError>;
}
