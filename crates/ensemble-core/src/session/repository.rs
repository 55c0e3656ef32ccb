//! Session snapshot repository trait.
//!
//! Defines the interface of the session fetch collaborator used for
//! rehydration after a reload.

use super::snapshot::SessionSnapshot;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract source of persisted session snapshots.
///
/// This trait decouples rehydration from the specific storage mechanism
/// (HTTP API, JSON files, database).
///
/// # Implementation Notes
///
/// Implementations should return sub-tasks in their persisted order and
/// keep every field verbatim; the synchronizer does no repair on import.
#[async_trait]
pub trait SessionSnapshotRepository: Send + Sync {
    /// Fetches the snapshot of a session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(SessionSnapshot))`: Snapshot found
    /// - `Ok(None)`: No such session
    /// - `Err(_)`: Error occurred during retrieval
    async fn fetch(&self, session_id: &str) -> Result<Option<SessionSnapshot>>;

    /// Lists the ids of all sessions this source can serve.
    async fn list_session_ids(&self) -> Result<Vec<String>>;
}
