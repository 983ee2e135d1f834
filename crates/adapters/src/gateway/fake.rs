// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake AI gateway for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AiGateway, GatewayError};
use async_trait::async_trait;
use parking_lot::Mutex;
use pilot_core::ContextSnapshot;
use std::collections::VecDeque;
use std::sync::Arc;

/// Recorded call to FakeAiGateway
#[derive(Debug, Clone)]
pub struct GatewayCall {
    pub prompt: String,
    pub context: ContextSnapshot,
}

struct FakeGatewayState {
    replies: VecDeque<Result<String, GatewayError>>,
    fallback: Option<String>,
    calls: Vec<GatewayCall>,
}

/// Fake gateway replying from a queue.
///
/// Queued replies are consumed in order; once the queue is empty the
/// fallback reply is returned, or `EmptyResponse` when none is set.
#[derive(Clone)]
pub struct FakeAiGateway {
    inner: Arc<Mutex<FakeGatewayState>>,
}

impl Default for FakeAiGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAiGateway {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeGatewayState {
                replies: VecDeque::new(),
                fallback: None,
                calls: Vec::new(),
            })),
        }
    }

    /// Queue a successful reply
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.inner.lock().replies.push_back(Ok(reply.into()));
    }

    /// Queue a failure
    pub fn push_error(&self, error: GatewayError) {
        self.inner.lock().replies.push_back(Err(error));
    }

    /// Reply used whenever the queue is empty
    pub fn set_fallback(&self, reply: impl Into<String>) {
        self.inner.lock().fallback = Some(reply.into());
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl AiGateway for FakeAiGateway {
    async fn send_message(
        &self,
        prompt: &str,
        context: &ContextSnapshot,
    ) -> Result<String, GatewayError> {
        let mut inner = self.inner.lock();
        inner.calls.push(GatewayCall {
            prompt: prompt.to_string(),
            context: context.clone(),
        });
        match inner.replies.pop_front() {
            Some(reply) => reply,
            None => inner.fallback.clone().ok_or(GatewayError::EmptyResponse),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
