use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionDescriptor;
use crate::task::{Artifact, TaskOutput, TaskSpec};

/// Lifecycle events published by the orchestrator for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// Plan authoring began.
    PlanStarted { session_id: String, title: String },
    /// Streaming fragment of the planner's reasoning.
    PlanThinking { session_id: String, delta: String },
    /// A plan was proposed (or refined) for a session.
    PlanProposed {
        session: SessionDescriptor,
        tasks: Vec<TaskSpec>,
    },
    /// The orchestrator paused for human review of a plan.
    PlanApprovalRequested {
        session_id: String,
        tasks: Vec<TaskSpec>,
    },
    /// The plan was edited after proposal.
    PlanRevised {
        session_id: String,
        tasks: Vec<TaskSpec>,
    },
    TaskStarted {
        session_id: String,
        task_id: String,
        started_at: DateTime<Utc>,
    },
    /// A task produced a deliverable while running.
    TaskArtifact {
        session_id: String,
        task_id: String,
        artifact: Artifact,
    },
    TaskCompleted {
        session_id: String,
        task_id: String,
        completed_at: DateTime<Utc>,
        #[serde(default)]
        duration_ms: Option<u64>,
        #[serde(default)]
        output: Option<TaskOutput>,
        /// Deliverables reported together with the result.
        #[serde(default)]
        artifacts: Vec<Artifact>,
    },
    TaskFailed {
        session_id: String,
        task_id: String,
        error: String,
    },
    /// Session-terminal event: the whole run finished.
    SessionCompleted { session_id: String },
    /// Session-terminal event: the whole run failed.
    SessionFailed {
        session_id: String,
        #[serde(default)]
        error: Option<String>,
    },
}

impl ExecutionEvent {
    /// The session this event belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            Self::PlanProposed { session, .. } => &session.session_id,
            Self::PlanStarted { session_id, .. }
            | Self::PlanThinking { session_id, .. }
            | Self::PlanApprovalRequested { session_id, .. }
            | Self::PlanRevised { session_id, .. }
            | Self::TaskStarted { session_id, .. }
            | Self::TaskArtifact { session_id, .. }
            | Self::TaskCompleted { session_id, .. }
            | Self::TaskFailed { session_id, .. }
            | Self::SessionCompleted { session_id }
            | Self::SessionFailed { session_id, .. } => session_id,
        }
    }

    /// The task this event targets, for task-level events.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::TaskStarted { task_id, .. }
            | Self::TaskArtifact { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::TaskFailed { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlanStarted { .. } => "plan_started",
            Self::PlanThinking { .. } => "plan_thinking",
            Self::PlanProposed { .. } => "plan_proposed",
            Self::PlanApprovalRequested { .. } => "plan_approval_requested",
            Self::PlanRevised { .. } => "plan_revised",
            Self::TaskStarted { .. } => "task_started",
            Self::TaskArtifact { .. } => "task_artifact",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
            Self::SessionCompleted { .. } => "session_completed",
            Self::SessionFailed { .. } => "session_failed",
        }
    }
}
