//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the root configuration
//! from the configuration file (~/.config/ensemble/config.toml).

use crate::paths::EnsemblePaths;
use ensemble_core::EnsembleError;
use ensemble_core::config::RootConfig;
use ensemble_core::error::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the root configuration.
///
/// The file is read once; later calls return the cached value until
/// [`invalidate_cache`](ConfigService::invalidate_cache) is called.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the default config file.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading `path` instead of the default location.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// A missing or empty file yields the defaults. A file that exists but
    /// does not parse is a `Config` error and is not cached.
    pub fn get_config(&self) -> Result<RootConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|e| EnsembleError::internal(format!("config cache poisoned: {}", e)))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        let mut write_lock = self
            .config
            .write()
            .map_err(|e| EnsembleError::internal(format!("config cache poisoned: {}", e)))?;
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        match self.config.write() {
            Ok(mut write_lock) => *write_lock = None,
            Err(e) => tracing::error!("[ConfigService] Failed to invalidate cache: {}", e),
        }
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => EnsemblePaths::config_file().map_err(|e| EnsembleError::config(e.to_string())),
        }
    }

    fn load_config(&self) -> Result<RootConfig> {
        let path = self.config_path()?;
        load_config_file(&path)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a `RootConfig` from a TOML file.
pub fn load_config_file(path: &Path) -> Result<RootConfig> {
    if !path.exists() {
        tracing::debug!("[ConfigService] No config at {:?}, using defaults", path);
        return Ok(RootConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(RootConfig::default());
    }

    toml::from_str(&content).map_err(|e| {
        tracing::error!("[ConfigService] Failed to parse {:?}: {}", path, e);
        EnsembleError::config(format!("Failed to parse {}: {}", path.display(), e))
    })
}
