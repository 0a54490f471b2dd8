//! Ollama wire payloads and the HTTP client that exchanges them.

use serde::{Deserialize, Serialize};

use crate::core::message::Message;

pub mod client;

pub use client::{ApiError, ModelRegistry, OllamaClient};

#[derive(Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    pub message: ChatResponseMessage,
}

#[derive(Serialize)]
pub struct DeleteModelRequest<'a> {
    pub model: &'a str,
}

/// Metadata the server reports for a model. Carried through to storage and
/// display without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDetails {
    pub format: String,
    pub family: String,
    pub families: Option<Vec<String>>,
    pub parameter_size: String,
    pub quantization_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDescriptor {
    pub name: String,
    pub modified_at: String,
    pub size: u64,
    pub digest: String,
    pub details: ModelDetails,
}

#[derive(Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}
