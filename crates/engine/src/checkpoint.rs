// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint persistence and the autosave task handle

use crate::session::Session;
use parking_lot::Mutex;
use pilot_core::{Checkpoint, CheckpointId, SessionId};
use pilot_storage::{CheckpointStore, StoreError};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Name given to checkpoints taken by the autosave timer
pub const AUTOSAVE_NAME: &str = "Auto-save checkpoint";

/// Writes the session's checkpoint list through an optional store.
///
/// Saves are serialized by `persist_lock` so concurrent writers cannot
/// reorder list versions on disk.
pub(crate) struct CheckpointManager {
    store: Option<Arc<dyn CheckpointStore>>,
    persist_lock: Mutex<()>,
}

impl CheckpointManager {
    pub fn new(store: Option<Arc<dyn CheckpointStore>>) -> Self {
        Self {
            store,
            persist_lock: Mutex::new(()),
        }
    }

    pub fn is_durable(&self) -> bool {
        self.store.is_some()
    }

    /// Previously persisted checkpoints, empty without a store.
    pub fn load(&self, session_id: &SessionId) -> Result<Vec<Checkpoint>, StoreError> {
        match &self.store {
            Some(store) => store.load(session_id),
            None => Ok(Vec::new()),
        }
    }

    /// Save the current list. Failures are logged, never returned.
    pub fn persist(&self, session_id: &SessionId, session: &Mutex<Session>) {
        let Some(store) = &self.store else {
            return;
        };
        let _guard = self.persist_lock.lock();
        let checkpoints = session.lock().checkpoints.clone();
        match store.save(session_id, &checkpoints) {
            Ok(()) => {
                tracing::debug!(session_id = %session_id, count = checkpoints.len(), "checkpoints persisted")
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "failed to persist checkpoints")
            }
        }
    }
}

/// Running autosave task. Dropping the handle stops it.
#[derive(Debug)]
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn stop(self) {
        drop(self);
    }

    /// The task exited, e.g. because its orchestrator was dropped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// What one autosave tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveTick {
    /// Session busy or idle
    Skipped,
    /// A snapshot was appended and persisted
    Saved(CheckpointId),
    /// COMPLETED cycled through CHECKPOINT_CREATING back to IDLE
    Cycled,
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
