//! Application layer for Ensemble.
//!
//! This crate holds the in-memory execution state synchronizer and the use
//! cases that feed it from persisted sessions.

pub mod session_restore;
pub mod sync;

pub use session_restore::SessionRestoreUseCase;
pub use sync::{SyncSnapshot, Synchronizer};
