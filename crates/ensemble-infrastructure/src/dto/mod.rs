//! Data transfer objects for persisted state.

pub mod session;

pub use session::{
    ArtifactDTO, ExecutionModeDTO, SessionDTO, SessionSnapshotDTO, StatusDTO, SubTaskDTO,
};
