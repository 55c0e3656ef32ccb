//! Structured task results and their one-time text projection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A citation attached to a task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// Result payload carried by a `task_completed` event.
///
/// Variants are tried in declaration order when deserializing, so a payload
/// with both `content` and a `source` citation list is always `Cited`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutput {
    /// Plain text, stored verbatim.
    Text(String),
    /// Content followed by a list of titled links.
    Cited {
        content: String,
        source: Vec<SourceRef>,
    },
    /// Content followed by an opaque `sources` value.
    Referenced { content: String, sources: Value },
    /// Content without any reference material.
    Content { content: String },
    /// Anything else the expert returned.
    Structured(Value),
}

impl TaskOutput {
    /// Renders the payload into the text stored on the task.
    ///
    /// Returns `None` for a JSON `null` payload. Empty citation lists and
    /// `null` sources render as the bare content.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Cited { content, source } if source.is_empty() => Some(content.clone()),
            Self::Cited { content, source } => {
                let mut out = format!("{content}\n\n---\n**Sources:**\n");
                for (index, src) in source.iter().enumerate() {
                    out.push_str(&format!("> {}. [{}]({})\n", index + 1, src.title, src.url));
                }
                Some(out)
            }
            Self::Referenced {
                content,
                sources: Value::Null,
            } => Some(content.clone()),
            Self::Referenced { content, sources } => {
                Some(format!("{content}\n\n---\n**Sources:** {sources}\n"))
            }
            Self::Content { content } => Some(content.clone()),
            Self::Structured(Value::Null) => None,
            Self::Structured(value) => Some(value.to_string()),
        }
    }
}

impl From<String> for TaskOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for TaskOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
