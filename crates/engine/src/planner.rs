// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a natural-language task into a draft workflow plan.

use crate::error::OrchestratorError;
use pilot_adapters::AiGateway;
use pilot_core::{
    ContextSnapshot, IdGen, Level, PlanId, PlanStatus, StepId, WorkflowPlan, WorkflowStep,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Plan as the model writes it. Everything but `steps` is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanDraft {
    #[serde(default)]
    description: Option<String>,
    steps: Vec<StepDraft>,
    #[serde(default, alias = "estimated_duration")]
    estimated_duration: Option<Value>,
    #[serde(default)]
    complexity: Option<String>,
    #[serde(default, alias = "risk_level", alias = "risk")]
    risk_level: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default, alias = "success_criteria")]
    success_criteria: Vec<String>,
    #[serde(default, alias = "rollback_plan")]
    rollback_plan: Vec<String>,
    #[serde(default, alias = "approval_required", alias = "requiresApproval")]
    approval_required: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepDraft {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(alias = "type")]
    action: String,
    #[serde(default, alias = "params")]
    parameters: Value,
    #[serde(default, alias = "depends_on", alias = "dependsOn")]
    dependencies: Vec<Value>,
    #[serde(default, alias = "max_retries")]
    max_retries: Option<u32>,
}

/// Model-backed planner
pub struct Planner<I: IdGen> {
    gateway: Arc<dyn AiGateway>,
    ids: I,
    default_max_retries: u32,
    actions: Vec<String>,
}

impl<I: IdGen> Planner<I> {
    pub fn new(gateway: Arc<dyn AiGateway>, ids: I, default_max_retries: u32) -> Self {
        Self {
            gateway,
            ids,
            default_max_retries,
            actions: pilot_core::action::BUILTIN
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }

    /// Action names advertised in the prompt
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }

    /// Ask the gateway for a plan and parse it into a draft.
    pub async fn generate_plan(
        &self,
        task: &str,
        context: &ContextSnapshot,
    ) -> Result<WorkflowPlan, OrchestratorError> {
        let prompt = build_prompt(task, context, &self.actions);
        let reply = self
            .gateway
            .send_message(&prompt, context)
            .await
            .map_err(|e| OrchestratorError::PlanningFailed(e.to_string()))?;
        let plan = parse_plan(
            &reply,
            task,
            PlanId::new(self.ids.next()),
            self.default_max_retries,
        )?;
        tracing::info!(
            plan_id = %plan.id,
            steps = plan.steps.len(),
            risk = %plan.risk_level,
            approval_required = plan.approval_required,
            "plan generated"
        );
        Ok(plan)
    }
}

/// Planning prompt embedding the task and serialized context.
pub fn build_prompt(task: &str, context: &ContextSnapshot, actions: &[String]) -> String {
    format!(
        "You are planning changes to a software workspace.\n\
         \n\
         Task: {task}\n\
         \n\
         Workspace context:\n{context}\n\
         \n\
         Reply with a single JSON object inside a ```json fence with the fields:\n\
         description, estimatedDuration, complexity (low|medium|high|critical),\n\
         riskLevel (low|medium|high|critical), dependencies, prerequisites,\n\
         successCriteria, rollbackPlan, approvalRequired, and steps.\n\
         Each step has: id, description, action, parameters, dependencies (ids of\n\
         earlier steps) and maxRetries.\n\
         Available actions: {actions}\n",
        context = context.to_prompt_string(),
        actions = actions.join(", "),
    )
}

/// Locate the JSON object in a model reply.
///
/// Prefers a ```json fence, then any fence holding an object, then the
/// outermost `{...}` span.
pub fn extract_json(reply: &str) -> Option<&str> {
    let mut rest = reply;
    let mut fallback_fence = None;
    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        let (lang, body_start) = match after.find('\n') {
            Some(nl) => (after[..nl].trim(), nl + 1),
            None => break,
        };
        let body = &after[body_start..];
        let Some(end) = body.find("```") else { break };
        let content = body[..end].trim();
        if lang.eq_ignore_ascii_case("json") {
            return Some(content);
        }
        if fallback_fence.is_none() && content.starts_with('{') {
            fallback_fence = Some(content);
        }
        rest = &body[end + 3..];
    }
    if fallback_fence.is_some() {
        return fallback_fence;
    }
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_level(field: &str, value: Option<&str>) -> Level {
    match value.map(str::parse::<Level>) {
        Some(Ok(level)) => level,
        Some(Err(e)) => {
            tracing::warn!(field, error = %e, "unrecognized level, using medium");
            Level::Medium
        }
        None => Level::Medium,
    }
}

/// Parse a model reply into a draft plan.
pub fn parse_plan(
    reply: &str,
    task: &str,
    id: PlanId,
    default_max_retries: u32,
) -> Result<WorkflowPlan, OrchestratorError> {
    let json = extract_json(reply)
        .ok_or_else(|| OrchestratorError::PlanningFailed("reply contains no JSON object".into()))?;
    let draft: PlanDraft = serde_json::from_str(json)
        .map_err(|e| OrchestratorError::PlanningFailed(format!("unparsable plan: {e}")))?;

    if draft.steps.is_empty() {
        return Err(OrchestratorError::PlanningFailed(
            "plan has no steps".into(),
        ));
    }

    let mut steps = Vec::with_capacity(draft.steps.len());
    let mut seen = HashSet::new();
    for (index, step) in draft.steps.into_iter().enumerate() {
        let id = match &step.id {
            Some(value) => id_text(value).ok_or_else(|| {
                OrchestratorError::PlanningFailed(format!("step {} has an invalid id", index + 1))
            })?,
            None => format!("step-{}", index + 1),
        };
        if !seen.insert(id.clone()) {
            return Err(OrchestratorError::PlanningFailed(format!(
                "duplicate step id {id}"
            )));
        }
        let dependencies = step
            .dependencies
            .iter()
            .map(|d| {
                id_text(d).map(StepId::new).ok_or_else(|| {
                    OrchestratorError::PlanningFailed(format!("step {id} has an invalid dependency"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let parameters = match step.parameters {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let mut built = WorkflowStep::new(id.as_str(), step.action, parameters)
            .with_max_retries(step.max_retries.unwrap_or(default_max_retries));
        built.description = step.description.unwrap_or_default();
        built.dependencies = dependencies;
        steps.push(built);
    }

    for step in &steps {
        if let Some(missing) = step
            .dependencies
            .iter()
            .find(|d| !seen.contains(d.as_str()))
        {
            return Err(OrchestratorError::PlanningFailed(format!(
                "step {} depends on unknown step {missing}",
                step.id
            )));
        }
    }

    let mut plan = WorkflowPlan::new(id, task, steps);
    if let Some(description) = draft.description.filter(|d| !d.trim().is_empty()) {
        plan.description = description;
    }
    plan.estimated_duration = match draft.estimated_duration {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    plan.complexity = parse_level("complexity", draft.complexity.as_deref());
    plan.risk_level = parse_level("riskLevel", draft.risk_level.as_deref());
    plan.dependencies = draft.dependencies;
    plan.prerequisites = draft.prerequisites;
    plan.success_criteria = draft.success_criteria;
    plan.rollback_plan = draft.rollback_plan;
    plan.status = PlanStatus::Draft;
    plan.approval_required = draft.approval_required.unwrap_or(true) || plan.requires_approval();
    Ok(plan)
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
