//! Persisted session snapshots, as returned by the session fetch API.
//!
//! A snapshot is what a client needs to rebuild its view of a run after a
//! reload. It has no notion of UI selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExecutionMode, Session, SessionStatus, estimated_steps_for};
use crate::task::{Artifact, Task, TaskStatus};

/// Session-level fields of a persisted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub session_id: String,
    pub summary: String,
    pub execution_mode: ExecutionMode,
    pub status: SessionStatus,
    /// Stored step estimate; recomputed from the task count when absent.
    pub estimated_steps: Option<usize>,
}

/// One task of a persisted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSubTask {
    pub id: String,
    pub expert_type: String,
    pub description: String,
    pub status: TaskStatus,
    pub sort_order: i64,
    pub output: Option<String>,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub artifacts: Vec<Artifact>,
}

/// A persisted session together with its ordered sub-tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: PersistedSession,
    pub sub_tasks: Vec<PersistedSubTask>,
}

impl PersistedSession {
    /// Converts into the live session record for a run of `task_count` tasks.
    pub fn into_session(self, task_count: usize) -> Session {
        Session {
            session_id: self.session_id,
            summary: self.summary,
            estimated_steps: self
                .estimated_steps
                .unwrap_or_else(|| estimated_steps_for(task_count)),
            execution_mode: self.execution_mode,
            status: self.status,
        }
    }
}

impl From<PersistedSubTask> for Task {
    fn from(sub_task: PersistedSubTask) -> Self {
        Task {
            id: sub_task.id,
            expert_type: sub_task.expert_type,
            description: sub_task.description,
            status: sub_task.status,
            sort_order: sub_task.sort_order,
            started_at: sub_task.started_at,
            completed_at: sub_task.completed_at,
            duration_ms: sub_task.duration_ms,
            output: sub_task.output,
            error: sub_task.error,
            artifacts: sub_task.artifacts,
        }
    }
}

impl From<Task> for PersistedSubTask {
    fn from(task: Task) -> Self {
        PersistedSubTask {
            id: task.id,
            expert_type: task.expert_type,
            description: task.description,
            status: task.status,
            sort_order: task.sort_order,
            output: task.output,
            error: task.error,
            duration_ms: task.duration_ms,
            started_at: task.started_at,
            completed_at: task.completed_at,
            artifacts: task.artifacts,
        }
    }
}
