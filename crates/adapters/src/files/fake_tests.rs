// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn records_calls_and_contents() {
    let files = FakeFileMutator::new();
    files.create_file("a.txt", "one").await.unwrap();
    files.modify_file("a.txt", "two").await.unwrap();

    assert_eq!(files.get("a.txt").as_deref(), Some("two"));
    assert_eq!(
        files.calls(),
        vec![
            FileCall::Create {
                path: "a.txt".to_string(),
                content: "one".to_string()
            },
            FileCall::Modify {
                path: "a.txt".to_string(),
                content: "two".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn injected_failures_are_consumed() {
    let files = FakeFileMutator::new();
    files.fail_next(1);
    assert!(files.create_file("a.txt", "x").await.is_err());
    assert!(files.create_file("a.txt", "x").await.is_ok());
    assert_eq!(files.calls().len(), 2);
}
