// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Capability adapters consumed by the orchestrator

pub mod command;
pub mod context;
pub mod files;
pub mod gateway;
pub mod subprocess;
pub mod tools;
pub mod traced;

pub use command::{
    CommandError, CommandOutput, CommandRunner, CommandValidator, DenyListValidator,
    ShellCommandRunner,
};
pub use context::{ContextError, ContextProvider, WorkspaceContextProvider};
pub use files::{FileError, FileMutator, LocalFileMutator};
pub use gateway::{AiGateway, GatewayError};
pub use tools::{NoOpToolInvoker, ToolError, ToolInvoker};
pub use traced::{TracedCommandRunner, TracedFiles, TracedGateway, TracedTools};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use command::{FakeCommandRunner, FakeCommandValidator};
#[cfg(any(test, feature = "test-support"))]
pub use context::FakeContextProvider;
#[cfg(any(test, feature = "test-support"))]
pub use files::{FakeFileMutator, FileCall};
#[cfg(any(test, feature = "test-support"))]
pub use gateway::{FakeAiGateway, GatewayCall};
#[cfg(any(test, feature = "test-support"))]
pub use tools::{FakeToolInvoker, ToolCall};
