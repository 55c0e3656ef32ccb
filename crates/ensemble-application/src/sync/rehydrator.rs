use ensemble_core::session::{PersistedSession, PersistedSubTask};
use ensemble_core::task::Task;

use super::registry::TaskRegistry;

/// One-shot importer of a persisted session, for the page-reload case.
///
/// It only rebuilds registry state. Choosing mode, initialization and focus
/// is left to the caller because a persisted run has no notion of selection.
pub struct SessionRehydrator;

impl SessionRehydrator {
    pub fn restore_from_session(
        registry: &mut TaskRegistry,
        session: PersistedSession,
        sub_tasks: Vec<PersistedSubTask>,
    ) {
        registry.restore_from_persisted_session(session, sub_tasks);
    }

    /// Task to focus after a restore: the first task (in render order) with
    /// artifacts, else the first task, else none.
    pub fn initial_selection(tasks: &[Task]) -> Option<String> {
        tasks
            .iter()
            .find(|task| task.has_artifacts())
            .or_else(|| tasks.first())
            .map(|task| task.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_core::task::{Artifact, TaskSpec};

    fn task(id: &str, sort_order: i64, with_artifact: bool) -> Task {
        let mut task = Task::from_spec(TaskSpec::new(id, "expert", id, sort_order));
        if with_artifact {
            task.artifacts.push(Artifact::new("document", "notes", "..."));
        }
        task
    }

    #[test]
    fn test_prefers_first_task_with_artifacts() {
        let tasks = vec![task("a", 0, false), task("b", 1, true), task("c", 2, true)];
        assert_eq!(SessionRehydrator::initial_selection(&tasks).as_deref(), Some("b"));
    }

    #[test]
    fn test_falls_back_to_first_task() {
        let tasks = vec![task("a", 0, false), task("b", 1, false)];
        assert_eq!(SessionRehydrator::initial_selection(&tasks).as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_plan_selects_nothing() {
        assert_eq!(SessionRehydrator::initial_selection(&[]), None);
    }
}
