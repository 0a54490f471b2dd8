use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::message::Message;

pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatThread {
    pub fn new() -> Self {
        Self::with_id(generate_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_CHAT_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn matches_title(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

impl Default for ChatThread {
    fn default() -> Self {
        Self::new()
    }
}

/// Random v4 UUID, e.g. `3f2b8c1e-9a4d-4e6f-8b21-0c5d7e9f1a2b`.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
