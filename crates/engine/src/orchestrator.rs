// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow orchestrator
//!
//! Drives a session through the state machine. Every state change goes
//! through [`Orchestrator::transition`] semantics: validate against the
//! table, append history, set the state and run the new state's entry
//! action. Entry actions that lead somewhere else chain iteratively.
//! Synchronous bookkeeping happens under the session lock; planning,
//! step execution, rollback and context refreshes run with it released.

use crate::checkpoint::{AutosaveHandle, AutosaveTick, CheckpointManager, AUTOSAVE_NAME};
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::executor::{ExecutionReport, StepExecutor};
use crate::handlers::{Collaborators, HandlerRegistry};
use crate::planner::Planner;
use crate::recovery::ErrorRecovery;
use crate::rollback;
use crate::session::Session;
use parking_lot::Mutex;
use pilot_adapters::{
    AiGateway, DenyListValidator, LocalFileMutator, ShellCommandRunner, ToolInvoker,
    TracedCommandRunner, TracedFiles, TracedGateway, TracedTools, WorkspaceContextProvider,
};
use pilot_core::{
    Checkpoint, CheckpointId, Clock, ContextSnapshot, ErrorRecord, FileChange, IdGen,
    OrchestratorState, PlanStatus, SessionId, StateTransitionRecord, StepId, StepStatus,
    SystemClock, ToolExecutionState, ToolMetrics, TransitionTable, UuidIdGen, WorkflowPlan,
    WorkflowStep,
};
use pilot_storage::{CheckpointStore, FsCheckpointStore};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Collaborators and storage an orchestrator is built from
#[derive(Clone)]
pub struct OrchestratorDeps {
    pub collaborators: Collaborators,
    pub registry: HandlerRegistry,
    /// Overrides the store derived from `OrchestratorConfig::state_dir`
    pub store: Option<Arc<dyn CheckpointStore>>,
}

impl OrchestratorDeps {
    /// Built-in handlers, storage taken from the config
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            registry: HandlerRegistry::with_builtins(),
            store: None,
        }
    }

    /// Local filesystem and shell collaborators rooted at the configured
    /// workspace, each wrapped with tracing.
    pub fn local<G: AiGateway>(
        gateway: G,
        config: &OrchestratorConfig,
    ) -> Result<Self, OrchestratorError> {
        let root = config.workspace_root.clone();
        let validator =
            DenyListValidator::new().map_err(|e| OrchestratorError::Config(e.to_string()))?;
        let collaborators = Collaborators::new(
            Arc::new(WorkspaceContextProvider::new(root.clone())),
            Arc::new(TracedGateway::new(gateway)),
            Arc::new(TracedFiles::new(LocalFileMutator::new(root.clone()))),
            Arc::new(validator),
            Arc::new(TracedCommandRunner::new(ShellCommandRunner::new(
                config.command_timeout,
            ))),
            root,
        );
        Ok(Self::new(collaborators))
    }

    /// Route MCP steps to `tools`
    pub fn with_tools<T: ToolInvoker>(mut self, tools: T) -> Self {
        self.collaborators = self
            .collaborators
            .with_tools(Arc::new(TracedTools::new(tools)));
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }
}

/// A requested state change
struct Next {
    to: OrchestratorState,
    reason: String,
    metadata: Option<Value>,
}

impl Next {
    fn new(to: OrchestratorState, reason: impl Into<String>) -> Self {
        Self {
            to,
            reason: reason.into(),
            metadata: None,
        }
    }

    fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Outstanding work after an entry action
enum Work {
    Done,
    Then(Next),
    /// Save the checkpoint list, then continue
    Persist(Next),
    /// Record the error, enter ERROR_RECOVERY and surface it to the caller
    Recover(OrchestratorError),
    Initialize,
    Plan { task: String },
    Execute { steps: Vec<WorkflowStep> },
    Rollback,
    RefreshContext,
}

struct Inner<C: Clock, I: IdGen> {
    session: Mutex<Session>,
    table: TransitionTable,
    config: OrchestratorConfig,
    collaborators: Collaborators,
    registry: HandlerRegistry,
    planner: Planner<I>,
    recovery: ErrorRecovery,
    checkpoints: CheckpointManager,
    session_id: SessionId,
    clock: C,
    ids: I,
}

/// Coordinates planning, approval, execution and checkpointing for one
/// session. Clones share the session.
pub struct Orchestrator<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    inner: Arc<Inner<C, I>>,
}

impl<C: Clock, I: IdGen> Clone for Orchestrator<C, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Orchestrator {
    /// Orchestrator on the system clock with UUID identifiers.
    pub fn new(deps: OrchestratorDeps, config: OrchestratorConfig) -> Self {
        Self::with_clock(deps, config, SystemClock, UuidIdGen)
    }
}

impl<C: Clock, I: IdGen> Orchestrator<C, I> {
    /// Orchestrator with an explicit clock and id source.
    ///
    /// Without a store in `deps`, a configured `state_dir` selects the
    /// filesystem store; otherwise checkpoints stay in memory.
    pub fn with_clock(
        deps: OrchestratorDeps,
        config: OrchestratorConfig,
        clock: C,
        ids: I,
    ) -> Self {
        let store = deps.store.or_else(|| {
            config
                .state_dir
                .as_ref()
                .map(|dir| Arc::new(FsCheckpointStore::new(dir)) as Arc<dyn CheckpointStore>)
        });
        let session_id = config
            .session_id
            .clone()
            .unwrap_or_else(|| SessionId::new(ids.next()));
        let planner = Planner::new(
            Arc::clone(&deps.collaborators.gateway),
            ids.clone(),
            config.default_max_retries,
        )
        .with_actions(deps.registry.actions());

        tracing::info!(
            session_id = %session_id,
            durable = store.is_some(),
            "orchestrator created"
        );

        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session::default()),
                table: TransitionTable::standard(),
                recovery: ErrorRecovery::new(config.max_consecutive_errors),
                checkpoints: CheckpointManager::new(store),
                collaborators: deps.collaborators,
                registry: deps.registry,
                planner,
                session_id,
                config,
                clock,
                ids,
            }),
        }
    }

    // ── Workflow lifecycle ──────────────────────────────────────────────────

    /// Plan `task`. Returns the plan once it awaits approval (or was
    /// auto-approved). A cancel that lands while the planner is working
    /// discards the plan and returns `Cancelled`.
    pub async fn start_workflow(&self, task: &str) -> Result<WorkflowPlan, OrchestratorError> {
        let first = self.begin_workflow(task)?;
        self.drive(Work::Then(first)).await?;
        let s = self.inner.session.lock();
        if s.state == OrchestratorState::Cancelled {
            return Err(OrchestratorError::Cancelled);
        }
        s.plan.clone().ok_or(OrchestratorError::NoActivePlan)
    }

    pub async fn approve_plan(&self, approver: &str) -> Result<WorkflowPlan, OrchestratorError> {
        let work = self.approve_locked(approver)?;
        self.drive(work).await?;
        self.inner
            .session
            .lock()
            .plan
            .clone()
            .ok_or(OrchestratorError::NoActivePlan)
    }

    /// Run the approved plan to a terminal state.
    ///
    /// Step failures show up in the report, not as errors.
    pub async fn execute_plan(&self) -> Result<ExecutionReport, OrchestratorError> {
        let work = self.execute_locked()?;
        self.drive(work).await?;
        Ok(self.report())
    }

    /// Valid from PLANNING, PENDING_APPROVAL and EXECUTING. An in-flight step
    /// finishes; later steps are skipped.
    pub fn cancel_workflow(&self) -> Result<(), OrchestratorError> {
        let mut s = self.inner.session.lock();
        let from = s.state;
        if !matches!(
            from,
            OrchestratorState::Planning
                | OrchestratorState::PendingApproval
                | OrchestratorState::Executing
        ) {
            return Err(OrchestratorError::InvalidTransition {
                from,
                to: OrchestratorState::Cancelled,
            });
        }
        self.enter(&mut s, Next::new(OrchestratorState::Cancelled, "cancelled by caller"))?;
        Ok(())
    }

    /// Request a state change and run the resulting entry actions.
    pub async fn transition(
        &self,
        to: OrchestratorState,
        reason: Option<&str>,
        metadata: Option<Value>,
    ) -> Result<(), OrchestratorError> {
        let next = Next {
            to,
            reason: reason.unwrap_or_default().to_string(),
            metadata,
        };
        self.drive(Work::Then(next)).await
    }

    // ── Checkpoints ─────────────────────────────────────────────────────────

    /// Snapshot the session and append it. Persisting is best effort.
    pub fn create_checkpoint(&self, name: &str) -> Checkpoint {
        let checkpoint = {
            let mut s = self.inner.session.lock();
            let checkpoint = self.snapshot_locked(&s, name);
            s.checkpoints.push(checkpoint.clone());
            checkpoint
        };
        tracing::info!(
            checkpoint_id = %checkpoint.id,
            name,
            state = %checkpoint.state,
            "checkpoint created"
        );
        self.persist_checkpoints();
        checkpoint
    }

    /// Bring back the plan, tool states, file changes, context and state
    /// recorded in checkpoint `id`. The checkpoint list is left as is.
    pub async fn restore_checkpoint(&self, id: &str) -> Result<(), OrchestratorError> {
        let work = self.restore_locked(id)?;
        self.drive(work).await?;

        let mut s = self.inner.session.lock();
        if let Some(checkpoint) = s.pending_restore.take() {
            if s.state == OrchestratorState::Idle && checkpoint.state != OrchestratorState::Idle {
                let now = self.inner.clock.epoch_ms();
                s.force_state(
                    checkpoint.state,
                    Some("restored from checkpoint".to_string()),
                    Some(json!({"checkpointId": checkpoint.id})),
                    now,
                );
            }
            tracing::info!(checkpoint_id = %checkpoint.id, state = %s.state, "checkpoint restored");
        }
        Ok(())
    }

    /// Spawn the periodic checkpoint task. Stops when the handle is
    /// dropped or every orchestrator clone is gone.
    pub fn start_autosave(&self) -> AutosaveHandle {
        let weak: Weak<Inner<C, I>> = Arc::downgrade(&self.inner);
        let period = self.inner.config.checkpoint_interval;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let orchestrator = Orchestrator { inner };
                let tick = orchestrator.autosave_tick().await;
                tracing::debug!(?tick, "autosave tick");
            }
        });
        AutosaveHandle::new(task)
    }

    /// One autosave pass.
    pub async fn autosave_tick(&self) -> AutosaveTick {
        enum Action {
            Skip,
            Saved(CheckpointId),
            Cycle,
        }

        let action = {
            let Some(mut s) = self.inner.session.try_lock() else {
                return AutosaveTick::Skipped;
            };
            match s.state {
                OrchestratorState::Idle => Action::Skip,
                OrchestratorState::Completed => Action::Cycle,
                _ => {
                    let checkpoint = self.snapshot_locked(&s, AUTOSAVE_NAME);
                    let id = checkpoint.id.clone();
                    s.checkpoints.push(checkpoint);
                    Action::Saved(id)
                }
            }
        };

        match action {
            Action::Skip => AutosaveTick::Skipped,
            Action::Saved(id) => {
                self.persist_checkpoints();
                AutosaveTick::Saved(id)
            }
            Action::Cycle => {
                match self
                    .transition(OrchestratorState::CheckpointCreating, Some("autosave"), None)
                    .await
                {
                    Ok(()) => AutosaveTick::Cycled,
                    Err(e) => {
                        tracing::debug!(error = %e, "autosave transition skipped");
                        AutosaveTick::Skipped
                    }
                }
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// Session that keys the persisted checkpoint document
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    pub fn current_state(&self) -> OrchestratorState {
        self.inner.session.lock().state
    }

    /// Every recorded transition, oldest first
    pub fn state_history(&self) -> Vec<StateTransitionRecord> {
        self.inner.session.lock().history.clone()
    }

    pub fn current_plan(&self) -> Option<WorkflowPlan> {
        self.inner.session.lock().plan.clone()
    }

    /// Per-step execution records of the current plan
    pub fn tool_execution_states(&self) -> BTreeMap<StepId, ToolExecutionState> {
        self.inner.session.lock().tool_states.clone()
    }

    /// Aggregates per action, across workflows
    pub fn tool_metrics(&self) -> BTreeMap<String, ToolMetrics> {
        self.inner.session.lock().metrics.snapshot()
    }

    pub fn clear_tool_metrics(&self) {
        self.inner.session.lock().metrics.clear();
    }

    /// Checkpoints in creation order, loaded ones first
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.inner.session.lock().checkpoints.clone()
    }

    pub fn error_history(&self) -> Vec<ErrorRecord> {
        self.inner.session.lock().errors.clone()
    }

    /// File changes made by the current plan that were not rolled back
    pub fn file_changes(&self) -> Vec<FileChange> {
        self.inner.session.lock().file_changes.clone()
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.inner.session.lock().consecutive_errors
    }

    /// Last captured context snapshot
    pub fn context(&self) -> ContextSnapshot {
        self.inner.session.lock().context.clone()
    }

    // ── Locked preparation ──────────────────────────────────────────────────

    fn begin_workflow(&self, task: &str) -> Result<Next, OrchestratorError> {
        let mut s = self.inner.session.lock();
        let now = self.inner.clock.epoch_ms();
        match s.state {
            OrchestratorState::Idle => {}
            OrchestratorState::Completed => {
                s.apply(
                    &self.inner.table,
                    OrchestratorState::Idle,
                    Some("starting new workflow".to_string()),
                    None,
                    now,
                )?;
            }
            OrchestratorState::Failed => {
                s.apply(
                    &self.inner.table,
                    OrchestratorState::Idle,
                    Some("starting new workflow".to_string()),
                    None,
                    now,
                )?;
                s.consecutive_errors = 0;
            }
            OrchestratorState::Cancelled => {
                s.force_state(
                    OrchestratorState::Idle,
                    Some("session reset after cancellation".to_string()),
                    None,
                    now,
                );
            }
            from => {
                return Err(OrchestratorError::InvalidTransition {
                    from,
                    to: OrchestratorState::Planning,
                })
            }
        }

        s.pending_task = Some(task.to_string());
        let to = if self.inner.checkpoints.is_durable() && !s.initialized {
            OrchestratorState::Initializing
        } else {
            OrchestratorState::Planning
        };
        tracing::info!(session_id = %self.inner.session_id, task, "workflow started");
        Ok(Next::new(to, "workflow started").with_metadata(json!({"task": task})))
    }

    fn approve_locked(&self, approver: &str) -> Result<Work, OrchestratorError> {
        let mut s = self.inner.session.lock();
        if s.plan.is_none() {
            return Err(OrchestratorError::NoActivePlan);
        }
        self.inner
            .table
            .validate(s.state, OrchestratorState::Approved)?;
        let now = self.inner.clock.epoch_ms();
        if let Some(plan) = s.plan.as_mut() {
            plan.approve(approver, now);
        }
        self.enter(
            &mut s,
            Next::new(OrchestratorState::Approved, format!("approved by {approver}"))
                .with_metadata(json!({"approver": approver})),
        )
    }

    fn execute_locked(&self) -> Result<Work, OrchestratorError> {
        let mut s = self.inner.session.lock();
        let plan = s.plan.as_ref().ok_or(OrchestratorError::NoActivePlan)?;
        if plan.status != PlanStatus::Approved {
            return Err(OrchestratorError::PlanNotApproved {
                status: plan.status,
            });
        }
        let plan_id = plan.id.clone();
        self.enter(
            &mut s,
            Next::new(OrchestratorState::Executing, "executing approved plan")
                .with_metadata(json!({"planId": plan_id})),
        )
    }

    fn restore_locked(&self, id: &str) -> Result<Work, OrchestratorError> {
        let mut s = self.inner.session.lock();
        let checkpoint = s
            .find_checkpoint(id)
            .cloned()
            .ok_or_else(|| OrchestratorError::CheckpointNotFound(id.to_string()))?;

        let from = s.state;
        match from {
            OrchestratorState::Idle => {}
            OrchestratorState::Completed | OrchestratorState::Failed => {
                let now = self.inner.clock.epoch_ms();
                s.apply(
                    &self.inner.table,
                    OrchestratorState::Idle,
                    Some("preparing checkpoint restore".to_string()),
                    None,
                    now,
                )?;
            }
            _ => {
                return Err(OrchestratorError::InvalidTransition {
                    from,
                    to: OrchestratorState::CheckpointRestoring,
                })
            }
        }

        s.pending_restore = Some(checkpoint);
        self.enter(
            &mut s,
            Next::new(OrchestratorState::CheckpointRestoring, "restoring checkpoint")
                .with_metadata(json!({"checkpointId": id})),
        )
    }

    fn snapshot_locked(&self, s: &Session, name: &str) -> Checkpoint {
        s.snapshot(
            CheckpointId::new(self.inner.ids.next()),
            name,
            self.checkpoint_time(s),
        )
    }

    /// Checkpoint timestamps strictly increase within a session.
    fn checkpoint_time(&self, s: &Session) -> u64 {
        let now = self.inner.clock.epoch_ms();
        s.checkpoints
            .last()
            .map_or(now, |last| now.max(last.timestamp + 1))
    }

    fn persist_checkpoints(&self) {
        self.inner
            .checkpoints
            .persist(&self.inner.session_id, &self.inner.session);
    }

    fn report(&self) -> ExecutionReport {
        let s = self.inner.session.lock();
        let outcome = s.last_outcome.clone().unwrap_or_default();
        ExecutionReport {
            results: outcome.results,
            final_state: s.state,
            failed_steps: outcome.failed,
            skipped_steps: outcome.skipped,
            rolled_back: outcome.rolled_back,
        }
    }

    // ── State machine ───────────────────────────────────────────────────────

    /// Run entry actions until the chain settles.
    ///
    /// The first error routed through ERROR_RECOVERY is returned once
    /// recovery has run.
    async fn drive(&self, first: Work) -> Result<(), OrchestratorError> {
        let mut work = first;
        let mut surfaced = None;
        loop {
            work = match work {
                Work::Done => break,
                Work::Then(next) => self.enter_next(next)?,
                Work::Persist(next) => {
                    self.persist_checkpoints();
                    self.enter_next(next)?
                }
                Work::Recover(error) => {
                    let work = self.enter_recovery(&error)?;
                    surfaced.get_or_insert(error);
                    work
                }
                Work::Initialize => self.initialize(),
                Work::Plan { task } => self.plan(task).await,
                Work::Execute { steps } => self.execute(steps).await,
                Work::Rollback => self.rollback().await,
                Work::RefreshContext => self.refresh_context().await,
            };
        }
        match surfaced {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn enter_next(&self, next: Next) -> Result<Work, OrchestratorError> {
        let mut s = self.inner.session.lock();
        self.enter(&mut s, next)
    }

    fn enter_recovery(&self, error: &OrchestratorError) -> Result<Work, OrchestratorError> {
        let mut s = self.inner.session.lock();
        let reason = error.to_string();
        s.record_error(reason.clone(), self.inner.clock.epoch_ms());
        self.enter(&mut s, Next::new(OrchestratorState::ErrorRecovery, reason))
    }

    /// Validate and apply one transition, then run the synchronous part of
    /// the new state's entry action.
    fn enter(&self, s: &mut Session, next: Next) -> Result<Work, OrchestratorError> {
        let now = self.inner.clock.epoch_ms();
        let from = s.state;
        s.apply(
            &self.inner.table,
            next.to,
            Some(next.reason).filter(|r| !r.is_empty()),
            next.metadata,
            now,
        )?;
        let span = tracing::info_span!("transition", session_id = %self.inner.session_id);
        let _enter = span.enter();
        tracing::info!(%from, to = %next.to, "state changed");
        Ok(self.on_entry(s, now))
    }

    fn on_entry(&self, s: &mut Session, now: u64) -> Work {
        match s.state {
            OrchestratorState::Idle => Work::Done,
            OrchestratorState::Initializing => {
                if self.inner.checkpoints.is_durable() && !s.initialized {
                    Work::Initialize
                } else {
                    s.initialized = true;
                    Work::Then(Next::new(OrchestratorState::Planning, "initialization complete"))
                }
            }
            OrchestratorState::Planning => match s.pending_task.clone() {
                Some(task) => Work::Plan { task },
                None => Work::Recover(OrchestratorError::PlanningFailed(
                    "no task to plan".to_string(),
                )),
            },
            OrchestratorState::PendingApproval => {
                let Some(plan) = s.plan.as_mut() else {
                    return Work::Done;
                };
                plan.status = PlanStatus::Pending;
                if self.inner.config.auto_approve && !plan.approval_required {
                    plan.approve("system", now);
                    return Work::Then(
                        Next::new(OrchestratorState::Approved, "auto-approved")
                            .with_metadata(json!({"approver": "system"})),
                    );
                }
                Work::Done
            }
            OrchestratorState::Approved => {
                if let Some(plan) = s.plan.as_mut() {
                    plan.status = PlanStatus::Approved;
                }
                s.consecutive_errors = 0;
                Work::Done
            }
            OrchestratorState::Executing => match s.plan.as_mut() {
                Some(plan) => {
                    plan.status = PlanStatus::Executing;
                    Work::Execute {
                        steps: plan.steps.clone(),
                    }
                }
                None => Work::Recover(OrchestratorError::NoActivePlan),
            },
            OrchestratorState::Evaluating => {
                let next = match &s.plan {
                    Some(plan) if plan.all_steps_completed() => {
                        if s.file_changes.is_empty() {
                            Next::new(OrchestratorState::Completed, "all steps completed")
                        } else {
                            Next::new(OrchestratorState::ContextUpdating, "files changed")
                        }
                    }
                    Some(plan) => {
                        let unfinished = plan
                            .steps
                            .iter()
                            .filter(|step| step.status != StepStatus::Completed)
                            .count();
                        Next::new(
                            OrchestratorState::Failed,
                            format!("{unfinished} step(s) did not complete"),
                        )
                    }
                    None => Next::new(OrchestratorState::Failed, "no plan to evaluate"),
                };
                Work::Then(next)
            }
            OrchestratorState::ContextUpdating => Work::RefreshContext,
            OrchestratorState::Completed => {
                if let Some(plan) = s.plan.as_mut() {
                    plan.status = PlanStatus::Completed;
                }
                s.consecutive_errors = 0;
                Work::Done
            }
            OrchestratorState::Failed => {
                if let Some(plan) = s.plan.as_mut() {
                    plan.status = PlanStatus::Failed;
                }
                Work::Done
            }
            OrchestratorState::Cancelled => {
                s.pending_task = None;
                if let Some(plan) = s.plan.as_mut() {
                    if plan.status == PlanStatus::Executing {
                        plan.status = PlanStatus::Failed;
                    }
                }
                Work::Done
            }
            OrchestratorState::RollingBack => Work::Rollback,
            OrchestratorState::ErrorRecovery => {
                s.consecutive_errors += 1;
                let decision = self.inner.recovery.decide(s.consecutive_errors);
                tracing::info!(
                    consecutive_errors = s.consecutive_errors,
                    max = self.inner.config.max_consecutive_errors,
                    ?decision,
                    "error recovery"
                );
                Work::Then(
                    Next::new(decision.target(), decision.reason())
                        .with_metadata(json!({"consecutiveErrors": s.consecutive_errors})),
                )
            }
            OrchestratorState::CheckpointCreating => {
                // record the state the checkpoint was requested from
                let state = s.history.last().map_or(s.state, |record| record.from);
                let checkpoint = s.snapshot_as(
                    state,
                    CheckpointId::new(self.inner.ids.next()),
                    AUTOSAVE_NAME,
                    self.checkpoint_time(s),
                );
                let id = checkpoint.id.clone();
                s.checkpoints.push(checkpoint);
                Work::Persist(
                    Next::new(OrchestratorState::Idle, "checkpoint created")
                        .with_metadata(json!({"checkpointId": id})),
                )
            }
            OrchestratorState::CheckpointRestoring => match s.pending_restore.clone() {
                Some(checkpoint) => {
                    s.restore_contents(&checkpoint);
                    Work::Then(
                        Next::new(OrchestratorState::Idle, "checkpoint restored")
                            .with_metadata(json!({"checkpointId": checkpoint.id})),
                    )
                }
                None => Work::Recover(OrchestratorError::CheckpointNotFound(
                    "no checkpoint selected".to_string(),
                )),
            },
        }
    }

    // ── Entry actions that await ────────────────────────────────────────────

    fn initialize(&self) -> Work {
        match self.inner.checkpoints.load(&self.inner.session_id) {
            Ok(loaded) => {
                let mut s = self.inner.session.lock();
                let added = s.merge_loaded(loaded);
                s.initialized = true;
                tracing::info!(
                    session_id = %self.inner.session_id,
                    loaded = added,
                    "persisted checkpoints loaded"
                );
                Work::Then(Next::new(OrchestratorState::Planning, "initialization complete"))
            }
            Err(e) => Work::Recover(e.into()),
        }
    }

    async fn plan(&self, task: String) -> Work {
        let context = self.capture_context().await;
        let result = self.inner.planner.generate_plan(&task, &context).await;
        let mut s = self.inner.session.lock();
        s.context = context;
        if s.state != OrchestratorState::Planning {
            tracing::info!(state = %s.state, "plan discarded, workflow no longer planning");
            return Work::Done;
        }
        match result {
            Ok(plan) => {
                let metadata = json!({"planId": plan.id, "steps": plan.steps.len()});
                s.pending_task = None;
                s.begin_plan(plan);
                Work::Then(
                    Next::new(OrchestratorState::PendingApproval, "plan generated")
                        .with_metadata(metadata),
                )
            }
            Err(e) => Work::Recover(e),
        }
    }

    async fn execute(&self, steps: Vec<WorkflowStep>) -> Work {
        let executor = StepExecutor::new(
            &self.inner.registry,
            &self.inner.collaborators,
            &self.inner.clock,
            self.inner.config.auto_retry,
        );
        let result = executor.execute_steps(steps, &self.inner.session).await;
        let mut s = self.inner.session.lock();
        match result {
            Ok(outcome) => {
                let rollback = outcome.rollback_required.clone();
                s.last_outcome = Some(outcome);
                if s.state != OrchestratorState::Executing {
                    return Work::Done;
                }
                match rollback {
                    Some(step) => Work::Then(
                        Next::new(
                            OrchestratorState::RollingBack,
                            format!("step {step} exhausted its retries"),
                        )
                        .with_metadata(json!({"stepId": step})),
                    ),
                    None => Work::Then(Next::new(OrchestratorState::Evaluating, "execution finished")),
                }
            }
            Err(e) => {
                if let Some(plan) = s.plan.as_mut() {
                    plan.status = PlanStatus::Failed;
                }
                Work::Recover(e)
            }
        }
    }

    async fn rollback(&self) -> Work {
        let completed = self.completed_steps();
        let result =
            rollback::revert_steps(&self.inner.registry, &self.inner.collaborators, &completed)
                .await;
        match result {
            Ok(reverted) => {
                let mut s = self.inner.session.lock();
                let now = self.inner.clock.epoch_ms();
                mark_rolled_back(&mut s, &completed, now);
                if let Some(outcome) = s.last_outcome.as_mut() {
                    outcome.rolled_back = true;
                }
                Work::Then(
                    Next::new(OrchestratorState::Failed, "rollback completed")
                        .with_metadata(json!({"revertedSteps": reverted})),
                )
            }
            Err(e) => Work::Recover(e),
        }
    }

    /// Completed plan steps in the order they ran.
    fn completed_steps(&self) -> Vec<WorkflowStep> {
        let s = self.inner.session.lock();
        let Some(plan) = &s.plan else {
            return Vec::new();
        };
        match &s.last_outcome {
            Some(outcome) => outcome
                .results
                .keys()
                .filter_map(|id| plan.step(id.as_str()).cloned())
                .collect(),
            None => plan
                .steps
                .iter()
                .filter(|step| step.status == StepStatus::Completed)
                .cloned()
                .collect(),
        }
    }

    async fn refresh_context(&self) -> Work {
        let context = self.capture_context().await;
        self.inner.session.lock().context = context;
        Work::Then(Next::new(OrchestratorState::Completed, "context refreshed"))
    }

    async fn capture_context(&self) -> ContextSnapshot {
        match self.inner.collaborators.context.current_context().await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(error = %e, "context unavailable, reusing last snapshot");
                self.inner.session.lock().context.clone()
            }
        }
    }
}

/// Reverted steps no longer count as completed and their file changes
/// are gone from the ledger.
fn mark_rolled_back(s: &mut Session, reverted: &[WorkflowStep], now: u64) {
    let ids: Vec<&StepId> = reverted.iter().map(|step| &step.id).collect();
    if let Some(plan) = s.plan.as_mut() {
        for step in plan.steps.iter_mut().filter(|step| ids.contains(&&step.id)) {
            step.status = StepStatus::Cancelled;
            step.error = Some("rolled back".to_string());
            step.end_time = Some(now);
        }
    }
    for id in &ids {
        if let Some(state) = s.tool_states.get_mut(*id) {
            state.status = StepStatus::Cancelled;
        }
    }
    s.file_changes
        .retain(|change| !change.step_id.as_ref().is_some_and(|id| ids.contains(&id)));
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
