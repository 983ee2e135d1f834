// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File step handlers.
//!
//! Each handler reads the file's previous content before touching it and
//! returns it as rollback data: `{"path": ..., "previous": <string|null>}`.

use super::{str_param, Collaborators, StepError, StepHandler, StepOutput};
use async_trait::async_trait;
use pilot_core::{FileChangeKind, WorkflowStep};
use serde_json::{json, Value};

const PATH_PARAMS: &[&str] = &["path", "filePath", "file_path"];
const CONTENT_PARAMS: &[&str] = &["content", "contents"];

fn path_of(step: &WorkflowStep) -> Result<&str, StepError> {
    str_param(step, PATH_PARAMS).ok_or_else(|| StepError::missing_param(step, "path"))
}

fn content_of(step: &WorkflowStep) -> Result<&str, StepError> {
    str_param(step, CONTENT_PARAMS).ok_or_else(|| StepError::missing_param(step, "content"))
}

/// Previous content recorded in rollback data, `None` if the file did not exist
fn previous_of(data: Option<&Value>) -> Result<(String, Option<String>), StepError> {
    let data = data.ok_or_else(|| StepError::fatal("no rollback data recorded"))?;
    let path = data
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| StepError::fatal("rollback data has no path"))?;
    let previous = data
        .get("previous")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok((path.to_string(), previous))
}

/// Handles `create_file`. Overwrites an existing file.
pub struct CreateFileHandler;

#[async_trait]
impl StepHandler for CreateFileHandler {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError> {
        let path = path_of(step)?;
        let content = content_of(step)?;
        let previous = collaborators.files.read_file(path).await?;
        collaborators.files.create_file(path, content).await?;
        Ok(StepOutput::new(json!({"path": path, "bytes": content.len()}))
            .with_rollback(json!({"path": path, "previous": previous}))
            .with_file_change(path, FileChangeKind::Created))
    }

    async fn rollback(
        &self,
        _step: &WorkflowStep,
        rollback_data: Option<&Value>,
        collaborators: &Collaborators,
    ) -> Result<(), StepError> {
        let (path, previous) = previous_of(rollback_data)?;
        match previous {
            Some(content) => collaborators.files.create_file(&path, &content).await?,
            None => collaborators.files.delete_file(&path).await?,
        }
        Ok(())
    }
}

/// Handles `modify_file`. The file must exist.
pub struct ModifyFileHandler;

#[async_trait]
impl StepHandler for ModifyFileHandler {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError> {
        let path = path_of(step)?;
        let content = content_of(step)?;
        let previous = collaborators.files.read_file(path).await?;
        collaborators.files.modify_file(path, content).await?;
        Ok(StepOutput::new(json!({"path": path, "bytes": content.len()}))
            .with_rollback(json!({"path": path, "previous": previous}))
            .with_file_change(path, FileChangeKind::Modified))
    }

    async fn rollback(
        &self,
        _step: &WorkflowStep,
        rollback_data: Option<&Value>,
        collaborators: &Collaborators,
    ) -> Result<(), StepError> {
        let (path, previous) = previous_of(rollback_data)?;
        if let Some(content) = previous {
            collaborators.files.modify_file(&path, &content).await?;
        }
        Ok(())
    }
}

/// Handles `delete_file`.
pub struct DeleteFileHandler;

#[async_trait]
impl StepHandler for DeleteFileHandler {
    async fn execute(
        &self,
        step: &WorkflowStep,
        collaborators: &Collaborators,
    ) -> Result<StepOutput, StepError> {
        let path = path_of(step)?;
        let previous = collaborators.files.read_file(path).await?;
        collaborators.files.delete_file(path).await?;
        Ok(StepOutput::new(json!({"path": path, "deleted": true}))
            .with_rollback(json!({"path": path, "previous": previous}))
            .with_file_change(path, FileChangeKind::Deleted))
    }

    async fn rollback(
        &self,
        _step: &WorkflowStep,
        rollback_data: Option<&Value>,
        collaborators: &Collaborators,
    ) -> Result<(), StepError> {
        let (path, previous) = previous_of(rollback_data)?;
        if let Some(content) = previous {
            collaborators.files.create_file(&path, &content).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
