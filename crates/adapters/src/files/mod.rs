// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace file mutation adapters

mod local;

pub use local::LocalFileMutator;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeFileMutator, FileCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from file operations
#[derive(Debug, Error)]
pub enum FileError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Creates, edits and removes files in the workspace.
///
/// Paths are workspace-relative.
#[async_trait]
pub trait FileMutator: Send + Sync + 'static {
    async fn create_file(&self, path: &str, content: &str) -> Result<(), FileError>;

    async fn modify_file(&self, path: &str, content: &str) -> Result<(), FileError>;

    async fn delete_file(&self, path: &str) -> Result<(), FileError>;

    /// Current content, or `None` when the file does not exist
    async fn read_file(&self, path: &str) -> Result<Option<String>, FileError>;
}
