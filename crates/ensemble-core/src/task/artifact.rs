//! Artifacts: deliverables produced by a task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One deliverable produced by a task (code, document, search result, markup...).
///
/// `sort_order` is assigned when the artifact is appended to its task and is
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Creates an artifact with a generated id and no sort position yet.
    pub fn new(
        artifact_type: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            artifact_type: artifact_type.into(),
            title: title.into(),
            content: content.into(),
            language: None,
            sort_order: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}
