//! The submit flow for one user message.
//!
//! Ordering within a submit: the title request (first message only) is
//! awaited and its rename committed, then the user message is appended, then
//! the completion is requested. The empty-thread check happens before the
//! title request and is not atomic with the append, so two overlapping
//! submits to a fresh thread can both request a title.

use std::error::Error as StdError;
use std::fmt;

use tracing::{debug, error};

use crate::core::message::Message;
use crate::core::store::{SessionStore, StoreError};
use crate::core::title::derive_title;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub chat_id: String,
    pub input: String,
    pub model: String,
    /// File name recorded as a plain-text note on the user message.
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOutcome {
    /// Set when this submit renamed the thread.
    pub title: Option<String>,
    /// `None` when the completion failed; the user message is still kept.
    pub reply: Option<Message>,
}

#[derive(Debug)]
pub enum SendError {
    EmptyInput,
    NoModel,
    UnknownChat(String),
    NoActiveServer,
    Store(StoreError),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::EmptyInput => write!(f, "Message is empty"),
            SendError::NoModel => write!(f, "No model selected"),
            SendError::UnknownChat(id) => write!(f, "No chat with id '{id}'"),
            SendError::NoActiveServer => write!(f, "No active server is configured"),
            SendError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for SendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SendError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SendError {
    fn from(err: StoreError) -> Self {
        SendError::Store(err)
    }
}

pub async fn send_message(
    store: &SessionStore,
    request: SendRequest,
) -> Result<SendOutcome, SendError> {
    let SendRequest {
        chat_id,
        input,
        model,
        attachment,
    } = request;

    if input.trim().is_empty() {
        return Err(SendError::EmptyInput);
    }
    if model.trim().is_empty() {
        return Err(SendError::NoModel);
    }

    let (prior, base_url) = store.read(|state| {
        let prior = state.chat(&chat_id).map(|chat| chat.messages.clone());
        let base_url = state.active_server().map(|server| server.base_url());
        (prior, base_url)
    });
    let prior = prior.ok_or_else(|| SendError::UnknownChat(chat_id.clone()))?;
    let base_url = base_url.ok_or(SendError::NoActiveServer)?;

    let mut user_message = Message::user(input.as_str());
    if let Some(file_name) = attachment.as_deref() {
        user_message = user_message.with_attachment(file_name);
    }

    let registry = store.registry();
    let mut outcome = SendOutcome::default();

    if prior.is_empty() {
        if let Some(title) = derive_title(registry.as_ref(), &base_url, &model, &input).await {
            store.rename_chat(&chat_id, title.as_str())?;
            outcome.title = Some(title);
        }
    }

    store.append_message(&chat_id, user_message.clone())?;

    let mut history = prior;
    history.push(user_message);
    match registry.chat_completion(&base_url, &model, &history).await {
        Ok(content) => {
            let reply = Message::assistant(content);
            store.append_message(&chat_id, reply.clone())?;
            debug!(chat_id, model, "assistant reply recorded");
            outcome.reply = Some(reply);
        }
        Err(err) => {
            error!(chat_id, error = %err, "Failed to send message");
        }
    }

    Ok(outcome)
}
