//! Session snapshot DTOs.
//!
//! These mirror the JSON served by the session fetch API, which uses
//! camelCase keys and lowercase status strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ensemble_core::session::{
    ExecutionMode, PersistedSession, PersistedSubTask, SessionSnapshot, SessionStatus,
};
use ensemble_core::task::{Artifact, TaskStatus};

/// Status DTO shared by sessions and sub-tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusDTO {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl From<StatusDTO> for TaskStatus {
    fn from(dto: StatusDTO) -> Self {
        match dto {
            StatusDTO::Pending => TaskStatus::Pending,
            StatusDTO::Running => TaskStatus::Running,
            StatusDTO::Completed => TaskStatus::Completed,
            StatusDTO::Failed => TaskStatus::Failed,
        }
    }
}

impl From<TaskStatus> for StatusDTO {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => StatusDTO::Pending,
            TaskStatus::Running => StatusDTO::Running,
            TaskStatus::Completed => StatusDTO::Completed,
            TaskStatus::Failed => StatusDTO::Failed,
        }
    }
}

impl From<StatusDTO> for SessionStatus {
    fn from(dto: StatusDTO) -> Self {
        match dto {
            StatusDTO::Pending => SessionStatus::Pending,
            StatusDTO::Running => SessionStatus::Running,
            StatusDTO::Completed => SessionStatus::Completed,
            StatusDTO::Failed => SessionStatus::Failed,
        }
    }
}

impl From<SessionStatus> for StatusDTO {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Pending => StatusDTO::Pending,
            SessionStatus::Running => StatusDTO::Running,
            SessionStatus::Completed => StatusDTO::Completed,
            SessionStatus::Failed => StatusDTO::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionModeDTO {
    #[default]
    Sequential,
    Parallel,
}

impl From<ExecutionModeDTO> for ExecutionMode {
    fn from(dto: ExecutionModeDTO) -> Self {
        match dto {
            ExecutionModeDTO::Sequential => ExecutionMode::Sequential,
            ExecutionModeDTO::Parallel => ExecutionMode::Parallel,
        }
    }
}

impl From<ExecutionMode> for ExecutionModeDTO {
    fn from(mode: ExecutionMode) -> Self {
        match mode {
            ExecutionMode::Sequential => ExecutionModeDTO::Sequential,
            ExecutionMode::Parallel => ExecutionModeDTO::Parallel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDTO {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<ArtifactDTO> for Artifact {
    fn from(dto: ArtifactDTO) -> Self {
        Artifact {
            id: dto.id,
            artifact_type: dto.artifact_type,
            title: dto.title,
            content: dto.content,
            language: dto.language,
            sort_order: dto.sort_order,
            created_at: dto.created_at,
        }
    }
}

impl From<Artifact> for ArtifactDTO {
    fn from(artifact: Artifact) -> Self {
        ArtifactDTO {
            id: artifact.id,
            artifact_type: artifact.artifact_type,
            title: artifact.title,
            content: artifact.content,
            language: artifact.language,
            sort_order: artifact.sort_order,
            created_at: artifact.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskDTO {
    pub id: String,
    #[serde(default)]
    pub expert_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: StatusDTO,
    /// Absent in payloads that rely on list order alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDTO>,
}

impl From<SubTaskDTO> for PersistedSubTask {
    fn from(dto: SubTaskDTO) -> Self {
        PersistedSubTask {
            id: dto.id,
            expert_type: dto.expert_type,
            description: dto.description,
            status: dto.status.into(),
            sort_order: dto.sort_order.unwrap_or_default(),
            output: dto.output,
            error: dto.error,
            duration_ms: dto.duration_ms,
            started_at: dto.started_at,
            completed_at: dto.completed_at,
            artifacts: dto.artifacts.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<PersistedSubTask> for SubTaskDTO {
    fn from(sub_task: PersistedSubTask) -> Self {
        SubTaskDTO {
            id: sub_task.id,
            expert_type: sub_task.expert_type,
            description: sub_task.description,
            status: sub_task.status.into(),
            sort_order: Some(sub_task.sort_order),
            output: sub_task.output,
            error: sub_task.error,
            duration_ms: sub_task.duration_ms,
            started_at: sub_task.started_at,
            completed_at: sub_task.completed_at,
            artifacts: sub_task.artifacts.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDTO {
    pub session_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub execution_mode: ExecutionModeDTO,
    #[serde(default)]
    pub status: StatusDTO,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_steps: Option<usize>,
}

impl From<SessionDTO> for PersistedSession {
    fn from(dto: SessionDTO) -> Self {
        PersistedSession {
            session_id: dto.session_id,
            summary: dto.summary,
            execution_mode: dto.execution_mode.into(),
            status: dto.status.into(),
            estimated_steps: dto.estimated_steps,
        }
    }
}

impl From<PersistedSession> for SessionDTO {
    fn from(session: PersistedSession) -> Self {
        SessionDTO {
            session_id: session.session_id,
            summary: session.summary,
            execution_mode: session.execution_mode.into(),
            status: session.status.into(),
            estimated_steps: session.estimated_steps,
        }
    }
}

/// One persisted session file: the session record plus its sub-tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshotDTO {
    pub session: SessionDTO,
    #[serde(default)]
    pub sub_tasks: Vec<SubTaskDTO>,
}

impl From<SessionSnapshotDTO> for SessionSnapshot {
    fn from(dto: SessionSnapshotDTO) -> Self {
        SessionSnapshot {
            session: dto.session.into(),
            sub_tasks: dto
                .sub_tasks
                .into_iter()
                .enumerate()
                .map(|(position, mut sub_task)| {
                    // Without an explicit order the list position is the order.
                    sub_task.sort_order.get_or_insert(position as i64);
                    sub_task.into()
                })
                .collect(),
        }
    }
}

impl From<SessionSnapshot> for SessionSnapshotDTO {
    fn from(snapshot: SessionSnapshot) -> Self {
        SessionSnapshotDTO {
            session: snapshot.session.into(),
            sub_tasks: snapshot.sub_tasks.into_iter().map(Into::into).collect(),
        }
    }
}
