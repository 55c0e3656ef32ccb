//! Session domain module.
//!
//! This module contains the session-level domain models, the typed event
//! protocol, persisted snapshots and the snapshot repository interface.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `SessionDescriptor`, `SessionStatus`, `ExecutionMode`
//! - `run_mode`: `RunMode` (simple vs. complex)
//! - `event`: `ExecutionEvent`, the closed set of lifecycle events
//! - `snapshot`: persisted session types used for rehydration
//! - `repository`: `SessionSnapshotRepository` trait
//!
//! # Usage
//!
//! ```ignore
//! use ensemble_core::session::{ExecutionEvent, Session, SessionDescriptor};
//! use ensemble_core::session::{SessionSnapshot, SessionSnapshotRepository};
//! ```

mod event;
mod model;
mod repository;
mod run_mode;
mod snapshot;

// Re-export public API
pub use event::ExecutionEvent;
pub use model::{
    ExecutionMode, Session, SessionDescriptor, SessionStatus, estimated_steps_for,
};
pub use repository::SessionSnapshotRepository;
pub use run_mode::RunMode;
pub use snapshot::{PersistedSession, PersistedSubTask, SessionSnapshot};
