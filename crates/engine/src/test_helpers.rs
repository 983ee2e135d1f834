// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for engine tests.

use crate::handlers::Collaborators;
use pilot_adapters::{
    FakeAiGateway, FakeCommandRunner, FakeCommandValidator, FakeContextProvider, FakeFileMutator,
    FakeToolInvoker,
};
use serde_json::json;
use std::sync::Arc;

/// Fake collaborators plus handles for inspecting them
pub(crate) struct FakeWorld {
    pub collaborators: Collaborators,
    pub context: FakeContextProvider,
    pub gateway: FakeAiGateway,
    pub files: FakeFileMutator,
    pub validator: FakeCommandValidator,
    pub runner: FakeCommandRunner,
    pub tools: FakeToolInvoker,
}

impl FakeWorld {
    pub fn new() -> Self {
        let context = FakeContextProvider::with_value(json!({"activeFile": "src/lib.rs"}));
        let gateway = FakeAiGateway::new();
        let files = FakeFileMutator::new();
        let validator = FakeCommandValidator::new();
        let runner = FakeCommandRunner::new();
        let tools = FakeToolInvoker::new();
        let collaborators = Collaborators::new(
            Arc::new(context.clone()),
            Arc::new(gateway.clone()),
            Arc::new(files.clone()),
            Arc::new(validator.clone()),
            Arc::new(runner.clone()),
            "/work",
        )
        .with_tools(Arc::new(tools.clone()));
        Self {
            collaborators,
            context,
            gateway,
            files,
            validator,
            runner,
            tools,
        }
    }
}
