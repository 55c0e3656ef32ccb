use chrono::{DateTime, Utc};
use ensemble_core::error::{EnsembleError, Result};
use ensemble_core::session::{
    PersistedSession, PersistedSubTask, Session, SessionDescriptor, SessionStatus,
    estimated_steps_for,
};
use ensemble_core::task::{Artifact, Task, TaskOutput, TaskPatch, TaskSpec, TaskStatus};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use super::render_cache::RenderCache;

/// How `initialize_plan` reconciled the incoming plan with the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChange {
    /// Same session: tasks were merged by id.
    Merged,
    /// New session: session and tasks were replaced wholesale.
    Replaced,
}

/// Task counts for progress display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub estimated_steps: usize,
}

/// Canonical store of the live session and its tasks.
///
/// The registry is the only owner of task records. Every operation that
/// changes state finishes by rebuilding the render cache; operations that
/// turn out to be no-ops (unknown ids, invalid transitions, refusals) leave
/// the cache version untouched.
///
/// The registry knows nothing about selection or the running-task set; the
/// synchronizer keeps those in step with the values returned here.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    session: Option<Session>,
    tasks: HashMap<String, Task>,
    cache: RenderCache,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Read accessors
    // ============================================================================

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether `session_id` is the live session.
    pub fn is_current_session(&self, session_id: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.session_id == session_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.tasks.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in render order.
    pub fn tasks(&self) -> &Arc<[Task]> {
        self.cache.tasks()
    }

    pub fn version(&self) -> u64 {
        self.cache.version()
    }

    pub fn render_cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Ids of every task whose status is `Running`.
    pub fn running_task_ids(&self) -> BTreeSet<String> {
        self.tasks
            .values()
            .filter(|task| task.is_running())
            .map(|task| task.id.clone())
            .collect()
    }

    pub fn progress(&self) -> Progress {
        let mut progress = Progress {
            total: self.tasks.len(),
            estimated_steps: self
                .session
                .as_ref()
                .map_or(0, |session| session.estimated_steps),
            ..Progress::default()
        };
        for task in self.tasks.values() {
            match task.status {
                TaskStatus::Pending => progress.pending += 1,
                TaskStatus::Running => progress.running += 1,
                TaskStatus::Completed => progress.completed += 1,
                TaskStatus::Failed => progress.failed += 1,
            }
        }
        progress
    }

    // ============================================================================
    // Plan operations
    // ============================================================================

    /// Applies a proposed plan.
    ///
    /// For the live session the task map is merged by id: unlisted tasks are
    /// dropped, new ones are added as pending, and known ones keep their
    /// status while taking the incoming description, expert and sort order.
    /// Any other session id replaces session and tasks entirely.
    pub fn initialize_plan(
        &mut self,
        descriptor: SessionDescriptor,
        specs: Vec<TaskSpec>,
    ) -> PlanChange {
        let change = if self.is_current_session(&descriptor.session_id) {
            let task_count = specs.len();
            if let Some(session) = self.session.as_mut() {
                session.summary = descriptor.summary;
                session.execution_mode = descriptor.execution_mode;
                session.estimated_steps = estimated_steps_for(task_count);
            }
            self.merge_tasks(specs);
            PlanChange::Merged
        } else {
            if let Some(previous) = &self.session {
                tracing::info!(
                    "[TaskRegistry] Session {} superseded by {}",
                    previous.session_id,
                    descriptor.session_id
                );
            }
            self.session = Some(Session::from_descriptor(
                descriptor,
                specs.len(),
                SessionStatus::Running,
            ));
            self.tasks = specs
                .into_iter()
                .map(|spec| (spec.id.clone(), Task::from_spec(spec)))
                .collect();
            PlanChange::Replaced
        };

        tracing::debug!(
            "[TaskRegistry] initialize_plan: {:?}, {} task(s)",
            change,
            self.tasks.len()
        );
        self.rebuild();
        change
    }

    fn merge_tasks(&mut self, specs: Vec<TaskSpec>) {
        {
            let listed: HashSet<&str> = specs.iter().map(|spec| spec.id.as_str()).collect();
            self.tasks.retain(|id, _| listed.contains(id.as_str()));
        }

        for spec in specs {
            match self.tasks.get_mut(&spec.id) {
                Some(existing) => existing.apply_spec(spec),
                None => {
                    self.tasks.insert(spec.id.clone(), Task::from_spec(spec));
                }
            }
        }
    }

    /// Replaces the task list after a plan edit.
    ///
    /// Tasks that were `Running` or `Completed` keep their runtime record;
    /// every other listed id becomes a fresh pending task. Unlisted ids are
    /// pruned.
    pub fn revise_tasks(&mut self, specs: Vec<TaskSpec>) {
        let mut previous = std::mem::take(&mut self.tasks);

        for spec in specs {
            // The first entry for an id wins; a repeat must not replace the
            // record kept above with a fresh pending task.
            if self.tasks.contains_key(&spec.id) {
                tracing::debug!("[TaskRegistry] revise_tasks: duplicate id {} ignored", spec.id);
                continue;
            }
            let task = match previous.remove(&spec.id) {
                Some(mut kept)
                    if matches!(kept.status, TaskStatus::Running | TaskStatus::Completed) =>
                {
                    kept.apply_spec(spec);
                    kept
                }
                _ => Task::from_spec(spec),
            };
            self.tasks.insert(task.id.clone(), task);
        }

        if !previous.is_empty() {
            tracing::debug!(
                "[TaskRegistry] revise_tasks pruned {} task(s): {:?}",
                previous.len(),
                previous.keys().collect::<Vec<_>>()
            );
        }

        let task_count = self.tasks.len();
        if let Some(session) = self.session.as_mut() {
            session.estimated_steps = estimated_steps_for(task_count);
        }
        self.rebuild();
    }

    /// Registers a session without touching its tasks unless the id changes.
    ///
    /// A different session id replaces the previous session and clears the
    /// task map. For the live session only non-empty descriptor fields are
    /// refreshed.
    pub fn open_session(&mut self, descriptor: SessionDescriptor, status: SessionStatus) {
        if self.is_current_session(&descriptor.session_id) {
            if let Some(session) = self.session.as_mut() {
                if !descriptor.summary.is_empty() {
                    session.summary = descriptor.summary;
                }
                session.execution_mode = descriptor.execution_mode;
            }
        } else {
            tracing::debug!(
                "[TaskRegistry] Opening session {} ({:?})",
                descriptor.session_id,
                status
            );
            self.session = Some(Session::from_descriptor(descriptor, 0, status));
            self.tasks.clear();
        }
        self.rebuild();
    }

    /// Moves the live session to `status`.
    ///
    /// Ignored for other session ids and once the session is terminal.
    pub fn set_session_status(&mut self, session_id: &str, status: SessionStatus) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.session_id != session_id {
            tracing::debug!(
                "[TaskRegistry] Ignoring status {:?} for stale session {}",
                status,
                session_id
            );
            return false;
        }
        if session.status.is_terminal() || session.status == status {
            return false;
        }
        session.status = status;
        self.rebuild();
        true
    }

    // ============================================================================
    // Task lifecycle
    // ============================================================================

    /// Marks a pending task as running.
    ///
    /// Returns `true` when the task is running after the call, including a
    /// duplicate start of an already running task (which does not re-stamp).
    pub fn start_task(&mut self, task_id: &str, started_at: DateTime<Utc>) -> bool {
        let Some(task) = self.tasks.get_mut(task_id) else {
            tracing::debug!("[TaskRegistry] start_task: unknown task {}", task_id);
            return false;
        };
        match task.status {
            TaskStatus::Running => true,
            TaskStatus::Pending => {
                task.status = TaskStatus::Running;
                task.started_at = Some(started_at);
                self.rebuild();
                true
            }
            TaskStatus::Completed | TaskStatus::Failed => {
                tracing::debug!(
                    "[TaskRegistry] start_task: task {} already {:?}",
                    task_id,
                    task.status
                );
                false
            }
        }
    }

    /// Marks a running task as completed and stores its formatted output.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn complete_task(
        &mut self,
        task_id: &str,
        completed_at: DateTime<Utc>,
        duration_ms: Option<u64>,
        output: Option<&TaskOutput>,
    ) -> bool {
        let Some(task) = self.transition(task_id, TaskStatus::Completed) else {
            return false;
        };
        let started_at = task.started_at;
        task.completed_at = Some(completed_at);
        task.duration_ms = duration_ms.or_else(|| {
            started_at.map(|started| (completed_at - started).num_milliseconds().max(0) as u64)
        });
        task.output = output.and_then(TaskOutput::render);
        self.rebuild();
        true
    }

    /// Marks a running task as failed.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn fail_task(&mut self, task_id: &str, error: impl Into<String>) -> bool {
        let Some(task) = self.transition(task_id, TaskStatus::Failed) else {
            return false;
        };
        task.error = Some(error.into());
        self.rebuild();
        true
    }

    fn transition(&mut self, task_id: &str, next: TaskStatus) -> Option<&mut Task> {
        let Some(task) = self.tasks.get_mut(task_id) else {
            tracing::debug!("[TaskRegistry] {:?}: unknown task {}", next, task_id);
            return None;
        };
        if !task.status.can_transition_to(next) {
            tracing::debug!(
                "[TaskRegistry] Ignoring {:?} -> {:?} for task {}",
                task.status,
                next,
                task_id
            );
            return None;
        }
        task.status = next;
        Some(task)
    }

    /// Appends an artifact to a task.
    ///
    /// A re-delivered artifact id is ignored. An artifact without a sort
    /// position is placed after the task's existing artifacts.
    pub fn add_artifact(&mut self, task_id: &str, mut artifact: Artifact) -> bool {
        let Some(task) = self.tasks.get_mut(task_id) else {
            tracing::debug!("[TaskRegistry] add_artifact: unknown task {}", task_id);
            return false;
        };
        if task.artifacts.iter().any(|existing| existing.id == artifact.id) {
            return false;
        }
        if artifact.sort_order.is_none() {
            let next = task
                .artifacts
                .iter()
                .filter_map(|existing| existing.sort_order)
                .max()
                .map_or(task.artifacts.len() as i64, |max| max + 1);
            artifact.sort_order = Some(next);
        }
        task.artifacts.push(artifact);
        self.rebuild();
        true
    }

    // ============================================================================
    // Direct CRUD
    // ============================================================================

    /// Adds a pending task. Refuses ids that already exist.
    pub fn add_task(&mut self, spec: TaskSpec) -> bool {
        if self.tasks.contains_key(&spec.id) {
            tracing::warn!("[TaskRegistry] add_task: task {} already exists", spec.id);
            return false;
        }
        self.tasks.insert(spec.id.clone(), Task::from_spec(spec));
        self.rebuild();
        true
    }

    pub fn update_task(&mut self, task_id: &str, patch: TaskPatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some(task) = self.tasks.get_mut(task_id) else {
            tracing::debug!("[TaskRegistry] update_task: unknown task {}", task_id);
            return false;
        };
        patch.apply_to(task);
        self.rebuild();
        true
    }

    /// Removes a task. Running tasks cannot be removed.
    pub fn delete_task(&mut self, task_id: &str) -> bool {
        let running = match self.tasks.get(task_id) {
            None => return false,
            Some(task) => task.is_running(),
        };
        if running {
            tracing::warn!(
                "[TaskRegistry] delete_task: refusing to delete running task {}",
                task_id
            );
            return false;
        }
        self.tasks.remove(task_id);
        self.rebuild();
        true
    }

    // ============================================================================
    // Bulk operations
    // ============================================================================

    /// Rebuilds session and tasks wholesale from a persisted snapshot.
    ///
    /// Statuses and artifacts are kept verbatim; no lifecycle rule is applied.
    pub fn restore_from_persisted_session(
        &mut self,
        session: PersistedSession,
        sub_tasks: Vec<PersistedSubTask>,
    ) {
        tracing::info!(
            "[TaskRegistry] Restoring session {} with {} task(s)",
            session.session_id,
            sub_tasks.len()
        );
        self.session = Some(session.into_session(sub_tasks.len()));
        self.tasks = sub_tasks
            .into_iter()
            .map(|sub_task| (sub_task.id.clone(), Task::from(sub_task)))
            .collect();
        self.rebuild();
    }

    /// Clears session and tasks.
    ///
    /// Refused while any task is running unless `force` is set.
    pub fn reset_tasks(&mut self, force: bool) -> Result<()> {
        let running = self.running_task_ids();
        if !running.is_empty() && !force {
            tracing::warn!(
                "[TaskRegistry] Refusing reset: {} task(s) still running: {:?}",
                running.len(),
                running
            );
            return Err(EnsembleError::TasksRunning {
                running: running.into_iter().collect(),
            });
        }
        if force && !running.is_empty() {
            tracing::info!(
                "[TaskRegistry] Forced reset with {} running task(s)",
                running.len()
            );
        }
        self.session = None;
        self.tasks.clear();
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        self.cache.rebuild(self.tasks.values());
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
