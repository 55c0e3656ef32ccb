use ensemble_core::session::RunMode;
use std::collections::BTreeSet;

/// Outcome of [`SelectionTracker::set_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    /// The requested mode was already active.
    Unchanged,
    /// The mode changed and nothing else needs to happen.
    Switched,
    /// Simple mode was entered: all session and task state must be dropped.
    ResetRequired,
}

/// UI-facing derived state: focus, running set, mode and initialization.
///
/// This tracker never reads or writes task records. The synchronizer feeds it
/// the results of registry operations.
#[derive(Debug, Default, Clone)]
pub struct SelectionTracker {
    mode: Option<RunMode>,
    selected_task_id: Option<String>,
    running_task_ids: BTreeSet<String>,
    is_initialized: bool,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<RunMode> {
        self.mode
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    pub fn running_task_ids(&self) -> &BTreeSet<String> {
        &self.running_task_ids
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Sets the run mode.
    ///
    /// Entering `Simple` clears this tracker's selection and running set and
    /// reports `ResetRequired` so the caller can drop the rest of the state.
    pub fn set_mode(&mut self, mode: RunMode) -> ModeChange {
        if self.mode == Some(mode) {
            return ModeChange::Unchanged;
        }
        tracing::debug!("[SelectionTracker] Mode {:?} -> {:?}", self.mode, mode);
        self.mode = Some(mode);
        match mode {
            RunMode::Simple => {
                self.selected_task_id = None;
                self.running_task_ids.clear();
                ModeChange::ResetRequired
            }
            RunMode::Complex => ModeChange::Switched,
        }
    }

    pub fn select_task(&mut self, task_id: Option<String>) {
        self.selected_task_id = task_id;
    }

    pub fn add_running_task_id(&mut self, task_id: &str) {
        self.running_task_ids.insert(task_id.to_string());
    }

    /// Returns `true` if the id was present.
    pub fn remove_running_task_id(&mut self, task_id: &str) -> bool {
        self.running_task_ids.remove(task_id)
    }

    /// Replaces the running set wholesale, e.g. after a plan replacement.
    pub fn reconcile_running(&mut self, running: BTreeSet<String>) {
        self.running_task_ids = running;
    }

    pub fn has_running_tasks(&self) -> bool {
        !self.running_task_ids.is_empty()
    }

    pub fn is_task_running(&self, task_id: &str) -> bool {
        self.running_task_ids.contains(task_id)
    }

    /// Applies the auto-focus rule for a task that just completed.
    ///
    /// The task becomes selected only when nothing is selected and it
    /// produced at least one artifact. Returns `true` if focus moved.
    pub fn focus_completed_task(&mut self, task_id: &str, has_artifacts: bool) -> bool {
        if self.selected_task_id.is_some() || !has_artifacts {
            return false;
        }
        tracing::debug!("[SelectionTracker] Auto-focusing task {}", task_id);
        self.selected_task_id = Some(task_id.to_string());
        true
    }

    /// Clears the selection if it points at a task that no longer exists.
    pub fn drop_stale_selection<F>(&mut self, exists: F)
    where
        F: Fn(&str) -> bool,
    {
        if let Some(selected) = self.selected_task_id.as_deref() {
            if !exists(selected) {
                tracing::debug!("[SelectionTracker] Clearing stale selection {}", selected);
                self.selected_task_id = None;
            }
        }
    }

    pub fn mark_initialized(&mut self) {
        self.is_initialized = true;
    }

    /// Clears selection and running set, keeping mode and initialization.
    pub fn reset(&mut self) {
        self.selected_task_id = None;
        self.running_task_ids.clear();
    }
}
