//! Naming a thread from its first prompt.

use tracing::{debug, error};

use crate::api::ModelRegistry;
use crate::core::message::Message;

pub fn title_prompt(input: &str) -> Message {
    Message::user(format!(
        "name this chat thread using 3 to 5 words based on this prompt: {input}"
    ))
}

/// Models like to wrap the name in quotes; drop every `"` in the reply.
pub fn clean_title(raw: &str) -> String {
    raw.replace('"', "")
}

/// Ask the model for a short thread name. Failures are logged and yield
/// `None` so the caller keeps the default title.
pub async fn derive_title(
    registry: &dyn ModelRegistry,
    base_url: &str,
    model: &str,
    input: &str,
) -> Option<String> {
    match registry
        .chat_completion(base_url, model, &[title_prompt(input)])
        .await
    {
        Ok(reply) => {
            let title = clean_title(&reply);
            debug!(%title, "derived thread title");
            Some(title)
        }
        Err(err) => {
            error!(error = %err, "Failed to generate title");
            None
        }
    }
}
