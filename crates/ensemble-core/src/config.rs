use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RootConfig {
    #[serde(default)]
    pub synchronizer: SyncConfig,
}

/// Behaviour switches for the execution state synchronizer.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Route every plan proposal through the HITL gate.
    pub require_plan_approval: bool,
    /// Focus a task when it completes with artifacts and nothing is selected.
    pub auto_focus_on_artifacts: bool,
    /// Directory holding persisted `<session_id>.json` snapshots.
    pub snapshot_dir: Option<PathBuf>,
    /// Default `tracing` filter, overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            require_plan_approval: false,
            auto_focus_on_artifacts: true,
            snapshot_dir: None,
            log_filter: "info".to_string(),
        }
    }
}
