//! JSON-file SessionSnapshotRepository implementation.

use crate::dto::SessionSnapshotDTO;
use crate::paths::EnsemblePaths;
use async_trait::async_trait;
use ensemble_core::EnsembleError;
use ensemble_core::error::Result;
use ensemble_core::session::{SessionSnapshot, SessionSnapshotRepository};
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "json";

/// Reads persisted session snapshots from a directory of JSON files.
///
/// Directory structure:
/// ```text
/// base_dir/
/// ├── session-id-1.json
/// └── session-id-2.json
/// ```
pub struct JsonSessionSnapshotRepository {
    base_dir: PathBuf,
}

impl JsonSessionSnapshotRepository {
    /// Creates a repository at the default snapshot directory.
    pub fn default_location() -> Result<Self> {
        let dir = EnsemblePaths::snapshot_dir().map_err(|e| EnsembleError::io(e.to_string()))?;
        Ok(Self::new(dir))
    }

    /// Creates a repository reading from `base_dir`. The directory does not
    /// need to exist; a missing directory holds no sessions.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn snapshot_path(&self, session_id: &str) -> Result<PathBuf> {
        if session_id.is_empty()
            || session_id.contains(['/', '\\'])
            || session_id.starts_with('.')
        {
            return Err(EnsembleError::data_access(format!(
                "Invalid session id: {:?}",
                session_id
            )));
        }
        Ok(self.base_dir.join(format!("{}.{}", session_id, EXTENSION)))
    }

    /// Writes a snapshot as pretty-printed JSON, creating the directory.
    pub async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let path = self.snapshot_path(&snapshot.session.session_id)?;
        fs::create_dir_all(&self.base_dir).await?;
        let dto = SessionSnapshotDTO::from(snapshot.clone());
        let json = serde_json::to_string_pretty(&dto)?;
        fs::write(&path, json).await?;
        tracing::debug!("[JsonSnapshotRepository] Saved {:?}", path);
        Ok(())
    }
}

#[async_trait]
impl SessionSnapshotRepository for JsonSessionSnapshotRepository {
    async fn fetch(&self, session_id: &str) -> Result<Option<SessionSnapshot>> {
        let path = self.snapshot_path(session_id)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::error!("[JsonSnapshotRepository] Failed to read {:?}: {}", path, e);
                return Err(e.into());
            }
        };

        let dto: SessionSnapshotDTO = serde_json::from_str(&content).map_err(|e| {
            tracing::error!("[JsonSnapshotRepository] Malformed snapshot {:?}: {}", path, e);
            EnsembleError::from(e)
        })?;
        Ok(Some(dto.into()))
    }

    async fn list_session_ids(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_core::session::{PersistedSession, PersistedSubTask, SessionStatus};
    use ensemble_core::task::{Artifact, TaskStatus};
    use tempfile::TempDir;

    fn snapshot(session_id: &str) -> SessionSnapshot {
        SessionSnapshot {
            session: PersistedSession {
                session_id: session_id.to_string(),
                summary: "Audit dependencies".to_string(),
                execution_mode: Default::default(),
                status: SessionStatus::Running,
                estimated_steps: Some(3),
            },
            sub_tasks: vec![PersistedSubTask {
                id: "scan".to_string(),
                expert_type: "security".to_string(),
                description: "Scan the lockfile".to_string(),
                status: TaskStatus::Failed,
                sort_order: 0,
                output: None,
                error: Some("advisory db unreachable".to_string()),
                duration_ms: Some(45),
                started_at: None,
                completed_at: None,
                artifacts: vec![Artifact::new("code", "report.txt", "0 issues")],
            }],
        }
    }

    #[tokio::test]
    async fn test_save_then_fetch_keeps_fields() {
        let dir = TempDir::new().unwrap();
        let repo = JsonSessionSnapshotRepository::new(dir.path().join("sessions"));
        let original = snapshot("s-1");

        repo.save(&original).await.unwrap();
        let fetched = repo.fetch("s-1").await.unwrap().unwrap();

        assert_eq!(fetched, original);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_none() {
        let dir = TempDir::new().unwrap();
        let repo = JsonSessionSnapshotRepository::new(dir.path());
        assert!(repo.fetch("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let repo = JsonSessionSnapshotRepository::new(dir.path());

        let err = repo.fetch("bad").await.unwrap_err();
        assert!(err.is_serialization());
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let repo = JsonSessionSnapshotRepository::new(dir.path());
        assert!(repo.fetch("../etc/passwd").await.is_err());
        assert!(repo.fetch("").await.is_err());
    }

    #[tokio::test]
    async fn test_list_session_ids() {
        let dir = TempDir::new().unwrap();
        let repo = JsonSessionSnapshotRepository::new(dir.path().join("sessions"));
        assert!(repo.list_session_ids().await.unwrap().is_empty());

        repo.save(&snapshot("b")).await.unwrap();
        repo.save(&snapshot("a")).await.unwrap();
        std::fs::write(dir.path().join("sessions").join("notes.txt"), "x").unwrap();

        assert_eq!(repo.list_session_ids().await.unwrap(), vec!["a", "b"]);
    }
}
