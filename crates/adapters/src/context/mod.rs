// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context providers

mod workspace;

pub use workspace::WorkspaceContextProvider;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeContextProvider;

use async_trait::async_trait;
use pilot_core::ContextSnapshot;
use thiserror::Error;

/// Errors from context operations
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("context unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies the editor/workspace context embedded in prompts and checkpoints
#[async_trait]
pub trait ContextProvider: Send + Sync + 'static {
    async fn current_context(&self) -> Result<ContextSnapshot, ContextError>;
}
