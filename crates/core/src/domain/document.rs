use serde::{Deserialize, Serialize};

/// One knowledge-base entry. Loaded once at startup and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub content: String,
}

impl Document {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self { title: title.into(), content: content.into() }
    }

    /// Block injected into inquiry prompts.
    pub fn as_context_block(&self) -> String {
        format!("[Source: {}]\n{}", self.title, self.content)
    }
}
