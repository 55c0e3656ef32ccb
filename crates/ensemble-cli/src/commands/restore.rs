use anyhow::{Context, Result};
use ensemble_application::{SessionRestoreUseCase, Synchronizer};
use ensemble_core::config::SyncConfig;
use ensemble_infrastructure::JsonSessionSnapshotRepository;
use std::path::PathBuf;
use std::sync::Arc;

use super::print_snapshot;

/// Picks the snapshot directory: the flag, then the config, then the
/// platform default.
pub fn repository(dir: Option<PathBuf>, config: &SyncConfig) -> Result<JsonSessionSnapshotRepository> {
    match dir.or_else(|| config.snapshot_dir.clone()) {
        Some(dir) => Ok(JsonSessionSnapshotRepository::new(dir)),
        None => JsonSessionSnapshotRepository::default_location()
            .context("No snapshot directory configured"),
    }
}

pub async fn run(session_id: &str, dir: Option<PathBuf>, config: SyncConfig) -> Result<()> {
    let repository = repository(dir, &config)?;
    let use_case = SessionRestoreUseCase::new(Arc::new(repository));
    let mut synchronizer = Synchronizer::new(config);

    use_case
        .restore(session_id, &mut synchronizer)
        .await
        .with_context(|| format!("Failed to restore session {}", session_id))?;

    print_snapshot(&synchronizer.snapshot())
}
