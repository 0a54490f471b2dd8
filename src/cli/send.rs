//! One-shot message submission

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use crate::cli::chats::resolve_chat_id;
use crate::core::config::Config;
use crate::core::conversation::{send_message, SendError, SendRequest};
use crate::core::store::SessionStore;

pub struct SendArgs {
    pub chat: Option<String>,
    pub model: Option<String>,
    pub attach: Option<PathBuf>,
    pub message: String,
}

/// `--model`, then the configured default, then the first model cached for
/// the active server.
pub fn resolve_model(store: &SessionStore, config: &Config, explicit: Option<String>) -> Option<String> {
    explicit
        .filter(|model| !model.trim().is_empty())
        .or_else(|| config.default_model.clone())
        .or_else(|| {
            store.read(|state| {
                state
                    .active_server()
                    .and_then(|server| server.models.first())
                    .map(|model| model.name.clone())
            })
        })
}

/// The named thread, else the current one, else a freshly created one.
/// Creating persists, so call this only after the input is validated.
fn target_chat(store: &SessionStore, needle: Option<&str>) -> Result<String, Box<dyn Error>> {
    if let Some(needle) = needle {
        return Ok(store.read(|state| resolve_chat_id(state, needle))?);
    }
    if let Some(id) = store.read(|state| state.current_chat().map(|chat| chat.id.clone())) {
        return Ok(id);
    }
    Ok(store.create_chat()?)
}

pub async fn run(
    args: SendArgs,
    store: &SessionStore,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    if args.message.trim().is_empty() {
        return Err(SendError::EmptyInput.into());
    }
    let model = resolve_model(store, config, args.model).ok_or(
        "No model selected. Pass --model, set one with 'ollama-chat config set default-model <name>', \
or run 'ollama-chat server refresh'.",
    )?;
    let chat_id = target_chat(store, args.chat.as_deref())?;

    let attachment = args.attach.as_ref().map(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });

    let outcome = send_message(
        store,
        SendRequest {
            chat_id,
            input: args.message,
            model,
            attachment,
        },
    )
    .await?;

    if let Some(title) = outcome.title {
        writeln!(out, "💬 {title}")?;
        writeln!(out)?;
    }
    match outcome.reply {
        Some(reply) => writeln!(out, "{}", reply.content)?,
        None => writeln!(
            out,
            "⚠️  No reply received. Your message was saved; check the server and try again."
        )?,
    }
    Ok(())
}
