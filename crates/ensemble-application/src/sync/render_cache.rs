use ensemble_core::task::Task;
use std::sync::Arc;

/// Sorted, versioned view over the task registry.
///
/// Every rebuild allocates a new array and bumps the version, so readers can
/// detect change by comparing the version (or the `Arc` pointer) alone.
#[derive(Debug, Clone)]
pub struct RenderCache {
    tasks: Arc<[Task]>,
    version: u64,
}

impl RenderCache {
    /// Creates an empty cache at version 0.
    pub fn new() -> Self {
        Self {
            tasks: Arc::from(Vec::new()),
            version: 0,
        }
    }

    /// Recomputes the array from `tasks`, ordered by `sort_order` then id.
    pub fn rebuild<'a, I>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut sorted: Vec<Task> = tasks.into_iter().cloned().collect();
        sorted.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.id.cmp(&b.id))
        });
        self.tasks = Arc::from(sorted);
        self.version += 1;
    }

    pub fn tasks(&self) -> &Arc<[Task]> {
        &self.tasks
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}
