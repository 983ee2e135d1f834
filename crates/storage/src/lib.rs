// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable checkpoint storage for pilot sessions

mod document;
mod store;

pub use document::{CheckpointDocument, StoreError};
pub use store::{CheckpointStore, FsCheckpointStore, MemoryCheckpointStore};
