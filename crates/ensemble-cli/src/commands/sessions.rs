use anyhow::Result;
use ensemble_application::SessionRestoreUseCase;
use ensemble_core::config::SyncConfig;
use std::path::PathBuf;
use std::sync::Arc;

use super::restore::repository;

pub async fn run(dir: Option<PathBuf>, config: &SyncConfig) -> Result<()> {
    let use_case = SessionRestoreUseCase::new(Arc::new(repository(dir, config)?));
    let ids = use_case.list_sessions().await?;
    if ids.is_empty() {
        eprintln!("No persisted sessions found");
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}
