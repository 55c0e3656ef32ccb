pub mod config_service;
pub mod dto;
pub mod json_session_snapshot_repository;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::json_session_snapshot_repository::JsonSessionSnapshotRepository;
pub use crate::paths::EnsemblePaths;
