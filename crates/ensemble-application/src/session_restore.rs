//! Session restore use case.
//!
//! Fetches a persisted session through a [`SessionSnapshotRepository`] and
//! hydrates a [`Synchronizer`] with it, for the reload case.

use ensemble_core::EnsembleError;
use ensemble_core::error::Result;
use ensemble_core::session::{SessionSnapshot, SessionSnapshotRepository};
use std::sync::Arc;

use crate::sync::Synchronizer;

/// Use case for restoring a previously persisted session.
///
/// The fetch is the only asynchronous step. A failed or empty fetch is
/// returned to the caller and leaves the synchronizer untouched.
pub struct SessionRestoreUseCase {
    repository: Arc<dyn SessionSnapshotRepository>,
}

impl SessionRestoreUseCase {
    pub fn new(repository: Arc<dyn SessionSnapshotRepository>) -> Self {
        Self { repository }
    }

    /// Loads a snapshot, failing with `NotFound` if it does not exist.
    pub async fn load(&self, session_id: &str) -> Result<SessionSnapshot> {
        match self.repository.fetch(session_id).await {
            Ok(Some(snapshot)) => Ok(snapshot),
            Ok(None) => Err(EnsembleError::not_found("Session", session_id)),
            Err(e) => {
                tracing::error!("[SessionRestore] Failed to fetch session {}: {}", session_id, e);
                Err(e)
            }
        }
    }

    /// Fetches `session_id` and hydrates `synchronizer` with it.
    ///
    /// Running tasks of the previous run do not block the restore; loading a
    /// different persisted session is the forced-reset case.
    pub async fn restore(&self, session_id: &str, synchronizer: &mut Synchronizer) -> Result<()> {
        let snapshot = self.load(session_id).await?;
        tracing::info!(
            "[SessionRestore] Restoring session {} ({} task(s))",
            session_id,
            snapshot.sub_tasks.len()
        );
        synchronizer.hydrate(snapshot);
        Ok(())
    }

    /// Ids of every session the repository can restore.
    pub async fn list_sessions(&self) -> Result<Vec<String>> {
        self.repository.list_session_ids().await
    }
}
