// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed file mutator rooted at the workspace.

use super::{FileError, FileMutator};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Applies file changes under a workspace root.
///
/// Absolute paths and `..` components are rejected so no step can write
/// outside the workspace.
#[derive(Debug, Clone)]
pub struct LocalFileMutator {
    root: PathBuf,
}

impl LocalFileMutator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FileError> {
        let relative = Path::new(path);
        if path.is_empty() {
            return Err(FileError::InvalidPath(path.to_string()));
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(FileError::InvalidPath(path.to_string())),
            }
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(path: &str, source: std::io::Error) -> FileError {
    if source.kind() == ErrorKind::NotFound {
        FileError::NotFound(path.to_string())
    } else {
        FileError::Io {
            path: path.to_string(),
            source,
        }
    }
}

#[async_trait]
impl FileMutator for LocalFileMutator {
    async fn create_file(&self, path: &str, content: &str) -> Result<(), FileError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(path, e))?;
        }
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn modify_file(&self, path: &str, content: &str) -> Result<(), FileError> {
        let full = self.resolve(path)?;
        if !tokio::fs::try_exists(&full)
            .await
            .map_err(|e| io_error(path, e))?
        {
            return Err(FileError::NotFound(path.to_string()));
        }
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn delete_file(&self, path: &str) -> Result<(), FileError> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| io_error(path, e))
    }

    async fn read_file(&self, path: &str) -> Result<Option<String>, FileError> {
        let full = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(path, e)),
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
