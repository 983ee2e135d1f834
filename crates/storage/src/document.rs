// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted checkpoint document.
//!
//! One JSON document per session holds the full checkpoint list:
//!
//! ```json
//! { "checkpoints": [...], "sessionId": "...", "timestamp": "2026-01-01T00:00:00Z" }
//! ```
//!
//! Saves are atomic: write to `.tmp`, fsync, rename, fsync the directory.

use chrono::{DateTime, Utc};
use pilot_core::{Checkpoint, SessionId};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid session id for storage: {0:?}")]
    InvalidSessionId(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Checkpoint list of one session as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointDocument {
    pub checkpoints: Vec<Checkpoint>,
    pub session_id: SessionId,
    /// When the document was written
    pub timestamp: DateTime<Utc>,
}

impl CheckpointDocument {
    pub fn new(session_id: SessionId, checkpoints: Vec<Checkpoint>) -> Self {
        Self {
            checkpoints,
            session_id,
            timestamp: Utc::now(),
        }
    }

    /// Save the document atomically.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, path)?;

        // Make the rename durable
        if let Some(parent) = parent {
            File::open(parent)?.sync_all()?;
        }
        Ok(())
    }

    /// Load the document if it exists.
    ///
    /// Returns `Ok(None)` if the file doesn't exist or is corrupt. Corrupt
    /// documents are moved aside to a rotating `.bak` file.
    pub fn load(path: &Path) -> Result<Option<Self>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                let bak_path = rotate_bak_path(path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak_path.display(),
                    "corrupt checkpoint document, moving to .bak and starting empty",
                );
                fs::rename(path, &bak_path)?;
                Ok(None)
            }
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
