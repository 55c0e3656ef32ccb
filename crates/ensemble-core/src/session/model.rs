//! Session domain model.
//!
//! This module contains the session record describing the one live
//! execution run tracked by the synchronizer.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a whole execution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The plan exists but is waiting (e.g. for human approval).
    #[default]
    Pending,
    /// Planning or execution is in progress.
    Running,
    /// The orchestrator reported the run as finished.
    Completed,
    /// The orchestrator reported the run as failed.
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// How the orchestrator schedules the plan's tasks.
///
/// Informs UI ordering only; the synchronizer does not enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

/// Session-level fields carried by a plan proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub session_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
}

impl SessionDescriptor {
    pub fn new(session_id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            summary: summary.into(),
            execution_mode: ExecutionMode::default(),
        }
    }

    pub fn with_execution_mode(mut self, execution_mode: ExecutionMode) -> Self {
        self.execution_mode = execution_mode;
        self
    }
}

/// The one live execution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identifier, stable for the run's lifetime
    pub session_id: String,
    /// Human-readable description of the plan
    pub summary: String,
    /// Plan size plus one slot reserved for the aggregation step
    pub estimated_steps: usize,
    pub execution_mode: ExecutionMode,
    pub status: SessionStatus,
}

impl Session {
    /// Builds a session record for a plan of `task_count` tasks.
    pub fn from_descriptor(
        descriptor: SessionDescriptor,
        task_count: usize,
        status: SessionStatus,
    ) -> Self {
        Self {
            session_id: descriptor.session_id,
            summary: descriptor.summary,
            estimated_steps: estimated_steps_for(task_count),
            execution_mode: descriptor.execution_mode,
            status,
        }
    }
}

/// Number of steps shown for a plan: one per task plus the synthesis step.
pub fn estimated_steps_for(task_count: usize) -> usize {
    task_count + 1
}
