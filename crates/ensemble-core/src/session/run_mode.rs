//! Run mode of the chat surface.

use serde::{Deserialize, Serialize};

/// Whether the conversation runs a single task or a multi-task plan.
///
/// Simple mode has no plan; entering it discards all session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// A single task answered directly, with no plan.
    Simple,
    /// A multi-task plan executed by several experts.
    Complex,
}
