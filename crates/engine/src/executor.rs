// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step executor
//!
//! Runs a plan's steps one at a time in dependency order. Handler calls
//! happen with the session lock released; every status, tool-state and
//! metrics update happens under it.

use crate::error::OrchestratorError;
use crate::handlers::{Collaborators, HandlerRegistry, StepError, StepHandler};
use crate::session::Session;
use indexmap::IndexMap;
use parking_lot::Mutex;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use pilot_core::{
    ApprovalInfo, Clock, ContextSnapshot, FileChange, OrchestratorState, StepId, StepStatus,
    ToolExecutionState, WorkflowStep,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;

/// What happened to each step of one execution
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ExecutionOutcome {
    /// Completed steps in execution order
    pub results: IndexMap<StepId, Value>,
    pub failed: Vec<StepId>,
    /// Steps never run: dependents of failures, or cut off by cancel or rollback
    pub skipped: Vec<StepId>,
    /// Step whose exhausted retries require rolling back
    pub rollback_required: Option<StepId>,
    pub rolled_back: bool,
}

/// Summary returned by `execute_plan`
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Results of completed steps, in execution order
    pub results: IndexMap<StepId, Value>,
    pub final_state: OrchestratorState,
    pub failed_steps: Vec<StepId>,
    pub skipped_steps: Vec<StepId>,
    pub rolled_back: bool,
}

/// Indices of `steps` in dependency order.
///
/// Fails with `CyclicDependency` when the dependency graph has a cycle
/// (self-dependencies included) and `InvalidPlan` for unknown or
/// duplicated ids.
pub fn execution_order(steps: &[WorkflowStep]) -> Result<Vec<usize>, OrchestratorError> {
    let mut graph = DiGraph::<usize, ()>::with_capacity(steps.len(), steps.len());
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let node = graph.add_node(i);
        if nodes.insert(step.id.as_str(), node).is_some() {
            return Err(OrchestratorError::InvalidPlan(format!(
                "duplicate step id {}",
                step.id
            )));
        }
    }
    for (i, step) in steps.iter().enumerate() {
        for dep in &step.dependencies {
            let Some(&from) = nodes.get(dep.as_str()) else {
                return Err(OrchestratorError::InvalidPlan(format!(
                    "step {} depends on unknown step {dep}",
                    step.id
                )));
            };
            graph.add_edge(from, NodeIndex::new(i), ());
        }
    }
    toposort(&graph, None)
        .map(|order| order.into_iter().map(|node| graph[node]).collect())
        .map_err(|cycle| {
            OrchestratorError::CyclicDependency(steps[graph[cycle.node_id()]].id.clone())
        })
}

enum StepRun {
    Completed(Value),
    Failed { should_rollback: bool },
}

/// Runs steps through the handler registry
pub(crate) struct StepExecutor<'a, C: Clock> {
    registry: &'a HandlerRegistry,
    collaborators: &'a Collaborators,
    clock: &'a C,
    auto_retry: bool,
}

impl<'a, C: Clock> StepExecutor<'a, C> {
    pub fn new(
        registry: &'a HandlerRegistry,
        collaborators: &'a Collaborators,
        clock: &'a C,
        auto_retry: bool,
    ) -> Self {
        Self {
            registry,
            collaborators,
            clock,
            auto_retry,
        }
    }

    /// Execute `steps` against the plan held in `session`.
    ///
    /// Plan-level defects (cycles, unknown actions) are returned before any
    /// step runs. Step failures are recorded, never returned.
    pub async fn execute_steps(
        &self,
        steps: Vec<WorkflowStep>,
        session: &Mutex<Session>,
    ) -> Result<ExecutionOutcome, OrchestratorError> {
        let order = execution_order(&steps)?;
        let mut handlers = HashMap::with_capacity(steps.len());
        for step in &steps {
            let handler = self.registry.get(&step.action).ok_or_else(|| {
                OrchestratorError::UnsupportedAction {
                    step: step.id.clone(),
                    action: step.action.clone(),
                }
            })?;
            handlers.insert(step.id.clone(), handler);
        }

        let approval = approval_of(session);
        let mut outcome = ExecutionOutcome::default();
        let mut statuses: HashMap<StepId, StepStatus> = HashMap::new();

        for (position, &index) in order.iter().enumerate() {
            let step = &steps[index];

            let cancelled = session.lock().state == OrchestratorState::Cancelled;
            if cancelled {
                tracing::info!(
                    remaining = order.len() - position,
                    "workflow cancelled, skipping remaining steps"
                );
                for &rest in &order[position..] {
                    self.skip(session, &steps[rest], "workflow cancelled");
                    outcome.skipped.push(steps[rest].id.clone());
                }
                break;
            }

            let failed_dep = step
                .dependencies
                .iter()
                .find(|dep| statuses.get(*dep) != Some(&StepStatus::Completed));
            if let Some(dep) = failed_dep {
                self.skip(session, step, &format!("dependency {dep} failed"));
                statuses.insert(step.id.clone(), StepStatus::Cancelled);
                outcome.skipped.push(step.id.clone());
                continue;
            }

            let Some(handler) = handlers.get(&step.id) else {
                continue;
            };
            let span = tracing::info_span!("step", step_id = %step.id, action = %step.action);
            let run = self
                .run_step(step, handler.clone(), approval.clone(), session)
                .instrument(span)
                .await;

            match run {
                StepRun::Completed(result) => {
                    statuses.insert(step.id.clone(), StepStatus::Completed);
                    outcome.results.insert(step.id.clone(), result);
                }
                StepRun::Failed { should_rollback } => {
                    statuses.insert(step.id.clone(), StepStatus::Failed);
                    outcome.failed.push(step.id.clone());
                    if should_rollback {
                        let reason = format!("execution stopped after step {} failed", step.id);
                        for &rest in &order[position + 1..] {
                            self.skip(session, &steps[rest], &reason);
                            outcome.skipped.push(steps[rest].id.clone());
                        }
                        outcome.rollback_required = Some(step.id.clone());
                        break;
                    }
                }
            }
        }

        Ok(outcome)
    }

    async fn run_step(
        &self,
        step: &WorkflowStep,
        handler: Arc<dyn StepHandler>,
        approval: Option<ApprovalInfo>,
        session: &Mutex<Session>,
    ) -> StepRun {
        let context = self.capture_context(session).await;
        let started_at = self.clock.epoch_ms();
        let started = self.clock.now();
        begin_step(session, step, context, approval, started_at);
        tracing::info!("executing");

        let mut current = step.clone();
        current.status = StepStatus::Executing;
        loop {
            let attempt_start = self.clock.now();
            let result = handler.execute(&current, self.collaborators).await;
            let duration_ms = self.clock.now().duration_since(attempt_start).as_millis() as u64;

            match result {
                Ok(output) => {
                    let now = self.clock.epoch_ms();
                    let result = output.result.clone();
                    {
                        let mut s = session.lock();
                        s.metrics.record(&step.action, true, duration_ms);
                        s.consecutive_errors = 0;
                        if let Some((path, kind)) = output.file_change {
                            s.file_changes.push(FileChange {
                                path,
                                kind,
                                step_id: Some(step.id.clone()),
                                timestamp: now,
                            });
                        }
                        if let Some(tool) = s.tool_states.get_mut(&step.id) {
                            tool.attempts += 1;
                            tool.status = StepStatus::Completed;
                            tool.result = Some(output.result.clone());
                            tool.error = None;
                            tool.end_time = Some(now);
                        }
                        if let Some(plan_step) = plan_step_mut(&mut s, &step.id) {
                            plan_step.status = StepStatus::Completed;
                            plan_step.result = Some(output.result);
                            plan_step.rollback_data = output.rollback_data;
                            plan_step.error = None;
                            plan_step.retry_count = current.retry_count;
                            plan_step.end_time = Some(now);
                        }
                    }
                    tracing::info!(
                        elapsed_ms = self.clock.now().duration_since(started).as_millis() as u64,
                        retries = current.retry_count,
                        "completed"
                    );
                    return StepRun::Completed(result);
                }
                Err(error) => {
                    let retry = self.auto_retry
                        && error.retryable
                        && current.retry_count < current.max_retries;
                    if retry {
                        current.retry_count += 1;
                    }
                    self.record_failure(session, &current, &error, duration_ms, !retry);
                    if retry {
                        tracing::warn!(
                            attempt = current.retry_count,
                            max_retries = current.max_retries,
                            error = %error,
                            "retrying"
                        );
                        continue;
                    }
                    let should_rollback = current.should_rollback();
                    tracing::error!(
                        elapsed_ms = self.clock.now().duration_since(started).as_millis() as u64,
                        retries = current.retry_count,
                        should_rollback,
                        error = %error,
                        "failed"
                    );
                    return StepRun::Failed { should_rollback };
                }
            }
        }
    }

    /// Record one failed attempt; `terminal` marks the step failed.
    fn record_failure(
        &self,
        session: &Mutex<Session>,
        step: &WorkflowStep,
        error: &StepError,
        duration_ms: u64,
        terminal: bool,
    ) {
        let now = self.clock.epoch_ms();
        let mut s = session.lock();
        s.metrics.record(&step.action, false, duration_ms);
        if let Some(tool) = s.tool_states.get_mut(&step.id) {
            tool.attempts += 1;
            tool.error = Some(error.message.clone());
            if terminal {
                tool.status = StepStatus::Failed;
                tool.end_time = Some(now);
            }
        }
        if let Some(plan_step) = plan_step_mut(&mut s, &step.id) {
            plan_step.retry_count = step.retry_count;
            plan_step.error = Some(error.message.clone());
            if terminal {
                plan_step.status = StepStatus::Failed;
                plan_step.end_time = Some(now);
            }
        }
    }

    fn skip(&self, session: &Mutex<Session>, step: &WorkflowStep, reason: &str) {
        tracing::info!(step_id = %step.id, reason, "step skipped");
        let now = self.clock.epoch_ms();
        let mut s = session.lock();
        if let Some(plan_step) = plan_step_mut(&mut s, &step.id) {
            plan_step.status = StepStatus::Cancelled;
            plan_step.error = Some(reason.to_string());
            plan_step.end_time = Some(now);
        }
    }

    async fn capture_context(&self, session: &Mutex<Session>) -> ContextSnapshot {
        match self.collaborators.context.current_context().await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(error = %e, "context unavailable, reusing last snapshot");
                session.lock().context.clone()
            }
        }
    }
}

fn plan_step_mut<'s>(session: &'s mut Session, id: &StepId) -> Option<&'s mut WorkflowStep> {
    session
        .plan
        .as_mut()
        .and_then(|plan| plan.step_mut(id.as_str()))
}

fn approval_of(session: &Mutex<Session>) -> Option<ApprovalInfo> {
    let s = session.lock();
    let plan = s.plan.as_ref()?;
    Some(ApprovalInfo {
        approved_by: plan.approved_by.clone()?,
        approved_at: plan.approved_at?,
    })
}

fn begin_step(
    session: &Mutex<Session>,
    step: &WorkflowStep,
    context: ContextSnapshot,
    approval: Option<ApprovalInfo>,
    now: u64,
) {
    let mut s = session.lock();
    s.tool_states.insert(
        step.id.clone(),
        ToolExecutionState {
            step_id: step.id.clone(),
            action: step.action.clone(),
            parameters: step.parameters.clone(),
            status: StepStatus::Executing,
            context,
            approval,
            start_time: now,
            end_time: None,
            attempts: 0,
            result: None,
            error: None,
        },
    );
    if let Some(plan_step) = plan_step_mut(&mut s, &step.id) {
        plan_step.status = StepStatus::Executing;
        plan_step.start_time = Some(now);
        plan_step.end_time = None;
        plan_step.error = None;
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
