// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint stores.

use crate::document::{CheckpointDocument, StoreError};
use parking_lot::Mutex;
use pilot_core::{Checkpoint, SessionId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Durable home for a session's checkpoint list.
///
/// `save` replaces the whole list; `load` returns an empty list for a
/// session that was never saved.
pub trait CheckpointStore: Send + Sync + 'static {
    fn save(&self, session: &SessionId, checkpoints: &[Checkpoint]) -> Result<(), StoreError>;

    fn load(&self, session: &SessionId) -> Result<Vec<Checkpoint>, StoreError>;
}

/// One JSON document per session under `<state_dir>/checkpoints/`.
#[derive(Debug, Clone)]
pub struct FsCheckpointStore {
    dir: PathBuf,
}

impl FsCheckpointStore {
    /// Store rooted at `<state_dir>/checkpoints`.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: state_dir.as_ref().join("checkpoints"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `session`.
    pub fn path_for(&self, session: &SessionId) -> Result<PathBuf, StoreError> {
        let id = session.as_str();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !id.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidSessionId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl CheckpointStore for FsCheckpointStore {
    fn save(&self, session: &SessionId, checkpoints: &[Checkpoint]) -> Result<(), StoreError> {
        let path = self.path_for(session)?;
        CheckpointDocument::new(session.clone(), checkpoints.to_vec()).save(&path)?;
        tracing::debug!(
            session_id = %session,
            count = checkpoints.len(),
            path = %path.display(),
            "checkpoints saved"
        );
        Ok(())
    }

    fn load(&self, session: &SessionId) -> Result<Vec<Checkpoint>, StoreError> {
        let path = self.path_for(session)?;
        Ok(CheckpointDocument::load(&path)?
            .map(|doc| doc.checkpoints)
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<SessionId, Vec<Checkpoint>>,
    saves: usize,
    fail_saves: bool,
    fail_loads: bool,
}

/// Process-local store. Clones share contents.
#[derive(Clone, Default)]
pub struct MemoryCheckpointStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }

    /// Make saves fail with `StoreError::Unavailable`
    pub fn set_fail_saves(&self, fail: bool) {
        self.inner.lock().fail_saves = fail;
    }

    /// Make loads fail with `StoreError::Unavailable`
    pub fn set_fail_loads(&self, fail: bool) {
        self.inner.lock().fail_loads = fail;
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&self, session: &SessionId, checkpoints: &[Checkpoint]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.fail_saves {
            return Err(StoreError::Unavailable("saves disabled".to_string()));
        }
        inner.sessions.insert(session.clone(), checkpoints.to_vec());
        inner.saves += 1;
        Ok(())
    }

    fn load(&self, session: &SessionId) -> Result<Vec<Checkpoint>, StoreError> {
        let inner = self.inner.lock();
        if inner.fail_loads {
            return Err(StoreError::Unavailable("loads disabled".to_string()));
        }
        Ok(inner.sessions.get(session).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
