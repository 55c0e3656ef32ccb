pub mod config;
pub mod error;
pub mod session;
pub mod task;

// Re-export common error type
pub use error::EnsembleError;
