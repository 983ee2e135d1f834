// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory file mutator for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{FileError, FileMutator};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Recorded call to FakeFileMutator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCall {
    Create { path: String, content: String },
    Modify { path: String, content: String },
    Delete { path: String },
}

struct FakeFileState {
    files: BTreeMap<String, String>,
    calls: Vec<FileCall>,
    /// Remaining failures injected into mutating calls
    failures: u32,
}

/// Fake file mutator backed by a map of path to content
#[derive(Clone)]
pub struct FakeFileMutator {
    inner: Arc<Mutex<FakeFileState>>,
}

impl Default for FakeFileMutator {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeFileMutator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeFileState {
                files: BTreeMap::new(),
                calls: Vec::new(),
                failures: 0,
            })),
        }
    }

    /// Seed a file without recording a call
    pub fn insert(&self, path: &str, content: &str) {
        self.inner
            .lock()
            .files
            .insert(path.to_string(), content.to_string());
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.inner.lock().files.get(path).cloned()
    }

    pub fn files(&self) -> BTreeMap<String, String> {
        self.inner.lock().files.clone()
    }

    pub fn calls(&self) -> Vec<FileCall> {
        self.inner.lock().calls.clone()
    }

    /// Fail the next `n` mutating calls with an io error
    pub fn fail_next(&self, n: u32) {
        self.inner.lock().failures = n;
    }

    fn take_failure(state: &mut FakeFileState, path: &str) -> Result<(), FileError> {
        if state.failures > 0 {
            state.failures -= 1;
            return Err(FileError::Io {
                path: path.to_string(),
                source: std::io::Error::other("injected failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FileMutator for FakeFileMutator {
    async fn create_file(&self, path: &str, content: &str) -> Result<(), FileError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FileCall::Create {
            path: path.to_string(),
            content: content.to_string(),
        });
        Self::take_failure(&mut inner, path)?;
        inner.files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn modify_file(&self, path: &str, content: &str) -> Result<(), FileError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FileCall::Modify {
            path: path.to_string(),
            content: content.to_string(),
        });
        Self::take_failure(&mut inner, path)?;
        match inner.files.get_mut(path) {
            Some(existing) => {
                *existing = content.to_string();
                Ok(())
            }
            None => Err(FileError::NotFound(path.to_string())),
        }
    }

    async fn delete_file(&self, path: &str) -> Result<(), FileError> {
        let mut inner = self.inner.lock();
        inner.calls.push(FileCall::Delete {
            path: path.to_string(),
        });
        Self::take_failure(&mut inner, path)?;
        inner
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FileError::NotFound(path.to_string()))
    }

    async fn read_file(&self, path: &str) -> Result<Option<String>, FileError> {
        Ok(self.inner.lock().files.get(path).cloned())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
