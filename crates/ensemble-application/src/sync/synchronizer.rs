use chrono::{DateTime, Utc};
use ensemble_core::config::SyncConfig;
use ensemble_core::error::Result;
use ensemble_core::session::{
    ExecutionEvent, RunMode, Session, SessionDescriptor, SessionSnapshot, SessionStatus,
};
use ensemble_core::task::{Artifact, Task, TaskOutput, TaskPatch, TaskSpec};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::hitl::{HitlGate, PendingPlan};
use super::planning::PlanningChannel;
use super::registry::{PlanChange, Progress, TaskRegistry};
use super::rehydrator::SessionRehydrator;
use super::selection::{ModeChange, SelectionTracker};

/// Owned read view of the synchronizer at one render-cache version.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSnapshot {
    pub version: u64,
    pub session: Option<Session>,
    #[serde(serialize_with = "serialize_tasks")]
    pub tasks: Arc<[Task]>,
    pub running_task_ids: BTreeSet<String>,
    pub selected_task_id: Option<String>,
    pub mode: Option<RunMode>,
    pub is_initialized: bool,
    pub pending_plan: Option<PendingPlan>,
    pub is_waiting_for_approval: bool,
    pub plan_thinking: String,
    pub progress: Progress,
}

fn serialize_tasks<S: Serializer>(tasks: &Arc<[Task]>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    tasks.as_ref().serialize(serializer)
}

impl SyncSnapshot {
    pub fn selected_task(&self) -> Option<&Task> {
        let selected = self.selected_task_id.as_deref()?;
        self.tasks.iter().find(|task| task.id == selected)
    }
}

/// Dispatch layer of the execution state synchronizer.
///
/// One `Synchronizer` tracks one client's view of a run. It owns every
/// component and is the only place where they are coordinated: events and UI
/// actions are applied to the registry first, then the selection tracker is
/// updated from what the registry reports.
///
/// All operations are synchronous and infallible except [`reset_tasks`],
/// which refuses to drop running tasks unless forced.
///
/// [`reset_tasks`]: Synchronizer::reset_tasks
#[derive(Debug, Default)]
pub struct Synchronizer {
    config: SyncConfig,
    registry: TaskRegistry,
    planning: PlanningChannel,
    selection: SelectionTracker,
    hitl: HitlGate,
}

impl Synchronizer {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // ============================================================================
    // Read accessors
    // ============================================================================

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn planning(&self) -> &PlanningChannel {
        &self.planning
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn hitl(&self) -> &HitlGate {
        &self.hitl
    }

    pub fn version(&self) -> u64 {
        self.registry.version()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            version: self.registry.version(),
            session: self.registry.session().cloned(),
            tasks: Arc::clone(self.registry.tasks()),
            running_task_ids: self.selection.running_task_ids().clone(),
            selected_task_id: self.selection.selected_task_id().map(str::to_string),
            mode: self.selection.mode(),
            is_initialized: self.selection.is_initialized(),
            pending_plan: self.hitl.pending_plan().cloned(),
            is_waiting_for_approval: self.hitl.is_waiting_for_approval(),
            plan_thinking: self.planning.content().to_string(),
            progress: self.registry.progress(),
        }
    }

    // ============================================================================
    // Event application
    // ============================================================================

    /// Applies one lifecycle event.
    ///
    /// Malformed, late and duplicate events degrade to no-ops; task-level
    /// events for any session other than the live one are ignored as stale.
    pub fn apply(&mut self, event: ExecutionEvent) {
        tracing::debug!(
            "[Synchronizer] apply {} (session={}, task={:?})",
            event.kind(),
            event.session_id(),
            event.task_id()
        );

        match event {
            ExecutionEvent::PlanStarted { session_id, title } => {
                self.start_plan(&session_id, &title);
            }
            ExecutionEvent::PlanThinking { session_id, delta } => {
                if self.planning.accepts(&session_id) {
                    self.planning.append_thinking(&delta);
                } else {
                    tracing::debug!(
                        "[Synchronizer] Dropping thinking delta for session {}",
                        session_id
                    );
                }
            }
            ExecutionEvent::PlanProposed { session, tasks } => {
                if self.config.require_plan_approval {
                    self.request_approval(session, tasks);
                } else {
                    self.initialize_plan(session, tasks);
                }
            }
            ExecutionEvent::PlanApprovalRequested { session_id, tasks } => {
                self.request_approval(SessionDescriptor::new(session_id, ""), tasks);
            }
            ExecutionEvent::PlanRevised { session_id, tasks } => {
                if self.is_stale(&session_id) {
                    return;
                }
                self.revise_tasks(tasks);
            }
            ExecutionEvent::TaskStarted {
                session_id,
                task_id,
                started_at,
            } => {
                if self.is_stale(&session_id) {
                    return;
                }
                self.start_task(&task_id, started_at);
            }
            ExecutionEvent::TaskArtifact {
                session_id,
                task_id,
                artifact,
            } => {
                if self.is_stale(&session_id) {
                    return;
                }
                self.registry.add_artifact(&task_id, artifact);
            }
            ExecutionEvent::TaskCompleted {
                session_id,
                task_id,
                completed_at,
                duration_ms,
                output,
                artifacts,
            } => {
                if self.is_stale(&session_id) {
                    return;
                }
                self.complete_task(&task_id, completed_at, duration_ms, output.as_ref(), artifacts);
            }
            ExecutionEvent::TaskFailed {
                session_id,
                task_id,
                error,
            } => {
                if self.is_stale(&session_id) {
                    return;
                }
                self.fail_task(&task_id, error);
            }
            ExecutionEvent::SessionCompleted { session_id } => {
                self.registry
                    .set_session_status(&session_id, SessionStatus::Completed);
            }
            ExecutionEvent::SessionFailed { session_id, error } => {
                if self
                    .registry
                    .set_session_status(&session_id, SessionStatus::Failed)
                {
                    tracing::warn!(
                        "[Synchronizer] Session {} failed: {}",
                        session_id,
                        error.as_deref().unwrap_or("no reason given")
                    );
                }
            }
        }
    }

    fn is_stale(&self, session_id: &str) -> bool {
        let stale = !self.registry.is_current_session(session_id);
        if stale {
            tracing::debug!("[Synchronizer] Ignoring event for stale session {}", session_id);
        }
        stale
    }

    // ============================================================================
    // Planning
    // ============================================================================

    /// Starts a planning round, opening a running session if none exists.
    pub fn start_plan(&mut self, session_id: &str, title: &str) {
        self.planning.start_plan(session_id, title);
        if self.registry.session().is_none() {
            self.registry
                .open_session(SessionDescriptor::new(session_id, title), SessionStatus::Running);
        }
    }

    pub fn append_thinking(&mut self, delta: &str) {
        self.planning.append_thinking(delta);
    }

    pub fn clear_thinking(&mut self) {
        self.planning.clear();
    }

    /// Applies a proposed plan straight to the registry.
    pub fn initialize_plan(&mut self, descriptor: SessionDescriptor, tasks: Vec<TaskSpec>) {
        let change = self.registry.initialize_plan(descriptor, tasks);
        if change == PlanChange::Replaced {
            self.discard_foreign_pending_plan();
        }
        self.reconcile_with_registry();
    }

    /// Applies an edited plan to the live session.
    pub fn revise_tasks(&mut self, tasks: Vec<TaskSpec>) {
        self.registry.revise_tasks(tasks);
        self.reconcile_with_registry();
    }

    fn request_approval(&mut self, descriptor: SessionDescriptor, tasks: Vec<TaskSpec>) {
        let session_id = descriptor.session_id.clone();
        // The live session is only re-registered when the id changes; its
        // tasks stay untouched until the buffered plan is approved.
        if !self.registry.is_current_session(&session_id) {
            self.registry.open_session(descriptor, SessionStatus::Pending);
            self.reconcile_with_registry();
        }
        tracing::info!(
            "[Synchronizer] Plan with {} task(s) awaiting approval for session {}",
            tasks.len(),
            session_id
        );
        self.hitl.set_pending_plan(&session_id, tasks);
    }

    /// Approves the plan waiting in the HITL gate.
    ///
    /// `edited` replaces the buffered task list when the reviewer changed it.
    /// Returns `false` if no plan was waiting.
    pub fn approve_plan(&mut self, edited: Option<Vec<TaskSpec>>) -> bool {
        let Some(pending) = self.hitl.clear_pending_plan() else {
            tracing::debug!("[Synchronizer] approve_plan: nothing awaiting approval");
            return false;
        };
        if !self.registry.is_current_session(&pending.session_id) {
            self.registry.open_session(
                SessionDescriptor::new(pending.session_id.as_str(), ""),
                SessionStatus::Running,
            );
        }
        self.registry
            .set_session_status(&pending.session_id, SessionStatus::Running);
        self.revise_tasks(edited.unwrap_or(pending.tasks));
        tracing::info!("[Synchronizer] Plan approved for session {}", pending.session_id);
        true
    }

    /// Rejects the plan waiting in the HITL gate without touching tasks.
    pub fn reject_plan(&mut self) -> bool {
        match self.hitl.clear_pending_plan() {
            Some(pending) => {
                tracing::info!("[Synchronizer] Plan rejected for session {}", pending.session_id);
                true
            }
            None => false,
        }
    }

    fn discard_foreign_pending_plan(&mut self) {
        let foreign = self
            .hitl
            .pending_plan()
            .is_some_and(|plan| !self.registry.is_current_session(&plan.session_id));
        if foreign {
            self.hitl.clear_pending_plan();
        }
    }

    // ============================================================================
    // Task lifecycle (registry and running set move together)
    // ============================================================================

    pub fn start_task(&mut self, task_id: &str, started_at: DateTime<Utc>) {
        if self.registry.start_task(task_id, started_at) {
            self.selection.add_running_task_id(task_id);
        }
    }

    pub fn complete_task(
        &mut self,
        task_id: &str,
        completed_at: DateTime<Utc>,
        duration_ms: Option<u64>,
        output: Option<&TaskOutput>,
        artifacts: Vec<Artifact>,
    ) {
        // A refused completion must leave no trace, artifacts included.
        if !self.registry.task(task_id).is_some_and(Task::is_running) {
            tracing::debug!("[Synchronizer] Ignoring completion of non-running task {}", task_id);
            return;
        }
        for artifact in artifacts {
            self.registry.add_artifact(task_id, artifact);
        }
        if !self
            .registry
            .complete_task(task_id, completed_at, duration_ms, output)
        {
            return;
        }
        self.selection.remove_running_task_id(task_id);

        if self.config.auto_focus_on_artifacts {
            let has_artifacts = self
                .registry
                .task(task_id)
                .is_some_and(Task::has_artifacts);
            self.selection.focus_completed_task(task_id, has_artifacts);
        }
    }

    pub fn fail_task(&mut self, task_id: &str, error: impl Into<String>) {
        if self.registry.fail_task(task_id, error) {
            self.selection.remove_running_task_id(task_id);
        }
    }

    pub fn add_artifact(&mut self, task_id: &str, artifact: Artifact) -> bool {
        self.registry.add_artifact(task_id, artifact)
    }

    // ============================================================================
    // UI actions
    // ============================================================================

    pub fn select_task(&mut self, task_id: Option<String>) {
        self.selection.select_task(task_id);
    }

    /// Switches run mode. Entering simple mode drops all run state.
    pub fn set_mode(&mut self, mode: RunMode) {
        if self.selection.set_mode(mode) == ModeChange::ResetRequired {
            tracing::info!("[Synchronizer] Entering simple mode, clearing run state");
            // Simple mode is a full reset, so running tasks do not block it.
            if let Err(e) = self.registry.reset_tasks(true) {
                tracing::error!("[Synchronizer] Forced reset failed: {}", e);
            }
            self.planning.clear();
            self.hitl.clear_pending_plan();
        }
    }

    /// Clears session and tasks.
    ///
    /// Refused with [`EnsembleError::TasksRunning`] while tasks are running
    /// unless `force` is set; callers should surface the refusal.
    ///
    /// [`EnsembleError::TasksRunning`]: ensemble_core::EnsembleError::TasksRunning
    pub fn reset_tasks(&mut self, force: bool) -> Result<()> {
        self.registry.reset_tasks(force)?;
        self.selection.reset();
        self.hitl.clear_pending_plan();
        Ok(())
    }

    pub fn add_task(&mut self, spec: TaskSpec) -> bool {
        self.registry.add_task(spec)
    }

    pub fn update_task(&mut self, task_id: &str, patch: TaskPatch) -> bool {
        self.registry.update_task(task_id, patch)
    }

    pub fn delete_task(&mut self, task_id: &str) -> bool {
        let deleted = self.registry.delete_task(task_id);
        if deleted {
            self.selection
                .drop_stale_selection(|id| self.registry.contains(id));
        }
        deleted
    }

    // ============================================================================
    // Rehydration
    // ============================================================================

    /// Replaces all state with a persisted session, for the reload case.
    ///
    /// Performs the full initialization sequence: restore the registry,
    /// rebuild the running set from restored statuses, enter complex mode,
    /// mark initialized and focus the initial task.
    pub fn hydrate(&mut self, snapshot: SessionSnapshot) {
        let SessionSnapshot { session, sub_tasks } = snapshot;
        SessionRehydrator::restore_from_session(&mut self.registry, session, sub_tasks);

        self.planning.clear();
        self.hitl.clear_pending_plan();
        self.selection
            .reconcile_running(self.registry.running_task_ids());
        self.selection.set_mode(RunMode::Complex);
        self.selection.mark_initialized();
        self.selection
            .select_task(SessionRehydrator::initial_selection(self.registry.tasks()));
    }

    /// Marks the synchronizer as initialized without restoring anything.
    pub fn mark_initialized(&mut self) {
        self.selection.mark_initialized();
    }

    fn reconcile_with_registry(&mut self) {
        self.selection
            .reconcile_running(self.registry.running_task_ids());
        let registry = &self.registry;
        self.selection
            .drop_stale_selection(|id| registry.contains(id));
    }
}

#[cfg(test)]
#[path = "synchronizer_test.rs"]
mod tests;
