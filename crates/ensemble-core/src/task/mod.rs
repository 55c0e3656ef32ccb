//! Task domain module.
//!
//! This module contains the task-related domain models: the task record
//! tracked during a session, its artifacts, and the structured results
//! reported on completion.
//!
//! # Module Structure
//!
//! - `model`: `Task`, `TaskStatus`, `TaskSpec`, `TaskPatch`
//! - `artifact`: `Artifact`
//! - `output`: `TaskOutput`, `SourceRef` and the completion-time projection
//!
//! # Usage
//!
//! ```ignore
//! use ensemble_core::task::{Task, TaskSpec, TaskStatus, TaskOutput, Artifact};
//! ```

mod artifact;
mod model;
mod output;

// Re-export public API
pub use artifact::Artifact;
pub use model::{Task, TaskPatch, TaskSpec, TaskStatus};
pub use output::{SourceRef, TaskOutput};
