// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::FakeWorld;
use pilot_core::test_support::{ai_step, step};

#[tokio::test]
async fn sends_prompt_with_context() {
    let world = FakeWorld::new();
    world.gateway.push_reply("fn main() {}");

    let output = AiGenerateHandler
        .execute(&ai_step("s1", "write main"), &world.collaborators)
        .await
        .unwrap();

    assert_eq!(output.result, json!({"content": "fn main() {}"}));
    let calls = world.gateway.calls();
    assert_eq!(calls[0].prompt, "write main");
    assert_eq!(calls[0].context.as_value()["activeFile"], "src/lib.rs");
}

#[tokio::test]
async fn context_failure_still_sends() {
    let world = FakeWorld::new();
    world.context.set_error("editor closed");
    world.gateway.push_reply("ok");

    AiGenerateHandler
        .execute(&ai_step("s1", "p"), &world.collaborators)
        .await
        .unwrap();
    assert!(world.gateway.calls()[0].context.is_empty());
}

#[tokio::test]
async fn gateway_failure_is_retryable() {
    let world = FakeWorld::new();
    let err = AiGenerateHandler
        .execute(&ai_step("s1", "p"), &world.collaborators)
        .await
        .unwrap_err();
    assert!(err.retryable);
}

#[tokio::test]
async fn missing_prompt_is_fatal() {
    let world = FakeWorld::new();
    let err = AiGenerateHandler
        .execute(&step("s1", "ai_generate", json!({})), &world.collaborators)
        .await
        .unwrap_err();
    assert!(!err.retryable);
    assert!(world.gateway.calls().is_empty());
}
