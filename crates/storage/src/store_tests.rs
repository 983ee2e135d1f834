// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pilot_core::{CheckpointId, ContextSnapshot, OrchestratorState};
use std::collections::BTreeMap;
use tempfile::tempdir;
use yare::parameterized;

fn checkpoint(id: &str) -> Checkpoint {
    Checkpoint {
        id: CheckpointId::new(id),
        name: id.to_string(),
        description: String::new(),
        timestamp: 5,
        state: OrchestratorState::Planning,
        context: ContextSnapshot::default(),
        tool_states: BTreeMap::new(),
        plan: None,
        file_changes: Vec::new(),
    }
}

#[test]
fn fs_store_writes_under_checkpoints_dir() {
    let dir = tempdir().unwrap();
    let store = FsCheckpointStore::new(dir.path());
    let session = SessionId::new("abc-123");

    store.save(&session, &[checkpoint("cp-1")]).unwrap();

    assert!(dir.path().join("checkpoints/abc-123.json").exists());
    let loaded = store.load(&session).unwrap();
    assert_eq!(loaded, vec![checkpoint("cp-1")]);
}

#[test]
fn fs_store_save_replaces_list() {
    let dir = tempdir().unwrap();
    let store = FsCheckpointStore::new(dir.path());
    let session = SessionId::new("s");

    store.save(&session, &[checkpoint("a")]).unwrap();
    store
        .save(&session, &[checkpoint("a"), checkpoint("b")])
        .unwrap();

    let ids: Vec<_> = store
        .load(&session)
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![CheckpointId::new("a"), CheckpointId::new("b")]);
}

#[test]
fn fs_store_unknown_session_is_empty() {
    let dir = tempdir().unwrap();
    let store = FsCheckpointStore::new(dir.path());
    assert!(store.load(&SessionId::new("never")).unwrap().is_empty());
}

#[parameterized(
    empty = { "" },
    slash = { "a/b" },
    parent = { ".." },
    hidden = { ".hidden" },
    space = { "a b" },
)]
fn fs_store_rejects_unsafe_session_ids(id: &str) {
    let store = FsCheckpointStore::new("/tmp/pilot");
    assert!(matches!(
        store.path_for(&SessionId::new(id)),
        Err(StoreError::InvalidSessionId(_))
    ));
}

#[test]
fn memory_store_shares_between_clones() {
    let store = MemoryCheckpointStore::new();
    let other = store.clone();
    let session = SessionId::new("s");

    store.save(&session, &[checkpoint("a")]).unwrap();

    assert_eq!(other.load(&session).unwrap().len(), 1);
    assert_eq!(other.save_count(), 1);
}

#[test]
fn memory_store_injected_failures() {
    let store = MemoryCheckpointStore::new();
    let session = SessionId::new("s");

    store.set_fail_saves(true);
    assert!(matches!(
        store.save(&session, &[]),
        Err(StoreError::Unavailable(_))
    ));
    assert_eq!(store.save_count(), 0);

    store.set_fail_loads(true);
    assert!(store.load(&session).is_err());
}
