// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn mutator() -> (tempfile::TempDir, LocalFileMutator) {
    let dir = tempfile::tempdir().unwrap();
    let files = LocalFileMutator::new(dir.path());
    (dir, files)
}

#[tokio::test]
async fn create_makes_parent_dirs() {
    let (dir, files) = mutator();
    files.create_file("src/deep/mod.rs", "pub fn x() {}").await.unwrap();
    let written = std::fs::read_to_string(dir.path().join("src/deep/mod.rs")).unwrap();
    assert_eq!(written, "pub fn x() {}");
}

#[tokio::test]
async fn modify_requires_existing_file() {
    let (_dir, files) = mutator();
    let err = files.modify_file("missing.txt", "x").await.unwrap_err();
    assert!(matches!(err, FileError::NotFound(p) if p == "missing.txt"));

    files.create_file("a.txt", "one").await.unwrap();
    files.modify_file("a.txt", "two").await.unwrap();
    assert_eq!(files.read_file("a.txt").await.unwrap().as_deref(), Some("two"));
}

#[tokio::test]
async fn delete_then_read_is_none() {
    let (_dir, files) = mutator();
    files.create_file("a.txt", "one").await.unwrap();
    files.delete_file("a.txt").await.unwrap();
    assert_eq!(files.read_file("a.txt").await.unwrap(), None);

    let err = files.delete_file("a.txt").await.unwrap_err();
    assert!(matches!(err, FileError::NotFound(_)));
}

#[parameterized(
    empty = { "" },
    absolute = { "/etc/passwd" },
    parent = { "../outside.txt" },
    nested_parent = { "src/../../outside.txt" },
)]
fn rejects_paths_outside_workspace(path: &str) {
    let files = LocalFileMutator::new("/tmp/pilot-root");
    assert!(matches!(
        files.resolve(path),
        Err(FileError::InvalidPath(_))
    ));
}

#[test]
fn accepts_relative_paths() {
    let files = LocalFileMutator::new("/tmp/pilot-root");
    assert_eq!(
        files.resolve("./src/lib.rs").unwrap(),
        PathBuf::from("/tmp/pilot-root/./src/lib.rs")
    );
}
