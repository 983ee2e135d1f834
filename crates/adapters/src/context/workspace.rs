// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context built from the workspace directory listing.

use super::{ContextError, ContextProvider};
use async_trait::async_trait;
use pilot_core::ContextSnapshot;
use serde_json::json;
use std::path::PathBuf;

/// Maximum number of top-level entries reported.
const MAX_ENTRIES: usize = 200;

/// Reports the workspace root and its top-level entries.
#[derive(Debug, Clone)]
pub struct WorkspaceContextProvider {
    root: PathBuf,
}

impl WorkspaceContextProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContextProvider for WorkspaceContextProvider {
    async fn current_context(&self) -> Result<ContextSnapshot, ContextError> {
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        let mut files = Vec::new();
        let mut directories = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if files.len() + directories.len() >= MAX_ENTRIES {
                break;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await?.is_dir() {
                directories.push(name);
            } else {
                files.push(name);
            }
        }
        files.sort();
        directories.sort();
        Ok(ContextSnapshot::new(json!({
            "workspaceRoot": self.root.display().to_string(),
            "files": files,
            "directories": directories,
        })))
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
