//! Task domain model.
//!
//! This module contains the task record held by the registry, the plan-level
//! task definition carried by plan events, and the patch used for manual
//! corrections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::artifact::Artifact;

/// Represents the current status of a task in a session.
///
/// Tasks progress through these states as lifecycle events arrive:
/// `Pending → Running → {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The task is part of the plan but has not started.
    #[default]
    Pending,
    /// The task is currently being executed by an expert.
    Running,
    /// The task completed successfully.
    Completed,
    /// The task failed during execution.
    Failed,
}

impl TaskStatus {
    /// Whether this status is terminal (`Completed` or `Failed`).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether moving from `self` to `next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

/// Plan-level definition of a task, as carried by plan events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    /// Category label of the expert the task is routed to.
    pub expert_type: String,
    pub description: String,
    #[serde(default)]
    pub sort_order: i64,
}

impl TaskSpec {
    pub fn new(
        id: impl Into<String>,
        expert_type: impl Into<String>,
        description: impl Into<String>,
        sort_order: i64,
    ) -> Self {
        Self {
            id: id.into(),
            expert_type: expert_type.into(),
            description: description.into(),
            sort_order,
        }
    }
}

/// One unit of work delegated to one expert within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub expert_type: String,
    pub description: String,
    pub status: TaskStatus,
    /// Deterministic render position, independent of arrival order.
    pub sort_order: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    /// Formatted result, set once on completion.
    pub output: Option<String>,
    /// Failure reason, set once on failure.
    pub error: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl Task {
    /// Creates a fresh pending task from its plan definition.
    pub fn from_spec(spec: TaskSpec) -> Self {
        Self {
            id: spec.id,
            expert_type: spec.expert_type,
            description: spec.description,
            status: TaskStatus::Pending,
            sort_order: spec.sort_order,
            started_at: None,
            completed_at: None,
            duration_ms: None,
            output: None,
            error: None,
            artifacts: Vec::new(),
        }
    }

    /// Overwrites the plan-level fields with those of `spec`, keeping runtime state.
    pub fn apply_spec(&mut self, spec: TaskSpec) {
        self.expert_type = spec.expert_type;
        self.description = spec.description;
        self.sort_order = spec.sort_order;
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    pub fn has_artifacts(&self) -> bool {
        !self.artifacts.is_empty()
    }
}

/// Partial update applied by `update_task`.
///
/// Status is deliberately absent: it only moves through lifecycle operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub expert_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.expert_type.is_none()
            && self.description.is_none()
            && self.sort_order.is_none()
            && self.output.is_none()
            && self.error.is_none()
    }

    /// Applies every field that is set.
    pub fn apply_to(self, task: &mut Task) {
        if let Some(expert_type) = self.expert_type {
            task.expert_type = expert_type;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(sort_order) = self.sort_order {
            task.sort_order = sort_order;
        }
        if let Some(output) = self.output {
            task.output = Some(output);
        }
        if let Some(error) = self.error {
            task.error = Some(error);
        }
    }
}
