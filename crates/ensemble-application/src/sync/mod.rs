//! Execution state synchronizer.
//!
//! The registry, selection tracker, planning channel and HITL gate each own
//! one slice of state and never reference one another. [`Synchronizer`] is the
//! dispatch layer that applies events to them in a fixed order.

pub mod hitl;
pub mod planning;
pub mod registry;
pub mod rehydrator;
pub mod render_cache;
pub mod selection;
pub mod synchronizer;

pub use hitl::{HitlGate, PendingPlan};
pub use planning::PlanningChannel;
pub use registry::{PlanChange, Progress, TaskRegistry};
pub use rehydrator::SessionRehydrator;
pub use render_cache::RenderCache;
pub use selection::{ModeChange, SelectionTracker};
pub use synchronizer::{SyncSnapshot, Synchronizer};
