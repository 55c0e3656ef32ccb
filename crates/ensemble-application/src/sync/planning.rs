/// Streaming "thinking aloud" text produced while a plan is authored.
///
/// Display-only state; it is independent of the registry's contents.
#[derive(Debug, Default, Clone)]
pub struct PlanningChannel {
    session_id: Option<String>,
    content: String,
}

impl PlanningChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the text to `title` for a new planning round.
    pub fn start_plan(&mut self, session_id: &str, title: &str) {
        self.session_id = Some(session_id.to_string());
        self.content = title.to_string();
    }

    pub fn append_thinking(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    /// Empties the text without touching session or task state.
    pub fn clear(&mut self) {
        self.session_id = None;
        self.content.clear();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Session the current text belongs to, if a plan was started.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Whether a thinking delta for `session_id` belongs to this channel.
    pub fn accepts(&self, session_id: &str) -> bool {
        self.session_id.as_deref().is_none_or(|current| current == session_id)
    }
}
