//! Runtime plumbing around the synchronizer: the single-writer event pump
//! and logging setup.

pub mod event_pump;
pub mod logging;

pub use event_pump::{EventPump, PumpHandle, SyncCommand};
pub use logging::init_logging;
