//! Path management for ensemble configuration and session snapshots.
//!
//! Paths follow the platform conventions exposed by the `dirs` crate
//! (XDG on Linux, Application Support on macOS, AppData on Windows).

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
    /// The platform data directory could not be determined.
    DataDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
            PathError::DataDirNotFound => write!(f, "Cannot find data directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for ensemble.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/ensemble/          # Config directory
/// └── config.toml              # Synchronizer configuration
///
/// ~/.local/share/ensemble/     # Data directory
/// └── sessions/                # Persisted <session_id>.json snapshots
/// ```
pub struct EnsemblePaths;

impl EnsemblePaths {
    const APP_NAME: &'static str = "ensemble";

    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(Self::APP_NAME))
            .ok_or(PathError::DataDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default location of persisted session snapshots, used when the
    /// configuration does not name one.
    pub fn snapshot_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("sessions"))
    }
}
