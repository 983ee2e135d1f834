// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake context provider for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ContextError, ContextProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use pilot_core::ContextSnapshot;
use serde_json::Value;
use std::sync::Arc;

struct FakeContextState {
    snapshot: ContextSnapshot,
    calls: usize,
    error: Option<String>,
}

/// Fake context provider returning a settable snapshot
#[derive(Clone)]
pub struct FakeContextProvider {
    inner: Arc<Mutex<FakeContextState>>,
}

impl Default for FakeContextProvider {
    fn default() -> Self {
        Self::new(ContextSnapshot::default())
    }
}

impl FakeContextProvider {
    pub fn new(snapshot: ContextSnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeContextState {
                snapshot,
                calls: 0,
                error: None,
            })),
        }
    }

    pub fn with_value(value: Value) -> Self {
        Self::new(ContextSnapshot::new(value))
    }

    /// Replace the snapshot returned by later calls
    pub fn set(&self, value: Value) {
        self.inner.lock().snapshot = ContextSnapshot::new(value);
    }

    /// Make every later call fail
    pub fn set_error(&self, message: &str) {
        self.inner.lock().error = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().calls
    }
}

#[async_trait]
impl ContextProvider for FakeContextProvider {
    async fn current_context(&self) -> Result<ContextSnapshot, ContextError> {
        let mut inner = self.inner.lock();
        inner.calls += 1;
        if let Some(message) = &inner.error {
            return Err(ContextError::Unavailable(message.clone()));
        }
        Ok(inner.snapshot.clone())
    }
}
