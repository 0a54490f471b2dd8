//! Chat thread commands and exports

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;

use crate::cli::ChatCommands;
use crate::core::chat::ChatThread;
use crate::core::export::{
    chat_export, chat_export_file_name, chats_export, chats_export_file_name, write_export,
};
use crate::core::store::{SessionState, SessionStore};

/// Resolve a thread by exact id, falling back to a unique id prefix.
pub fn resolve_chat_id(state: &SessionState, needle: &str) -> Result<String, String> {
    if state.chat(needle).is_some() {
        return Ok(needle.to_string());
    }
    let matches: Vec<&ChatThread> = state
        .chats
        .iter()
        .filter(|chat| chat.id.starts_with(needle))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(format!("No chat with id '{needle}'")),
        _ => Err(format!(
            "Chat id '{needle}' is ambiguous ({} matches). Use more characters.",
            matches.len()
        )),
    }
}

fn resolve_or_current(store: &SessionStore, id: Option<&str>) -> Result<String, Box<dyn Error>> {
    store.read(|state| match id {
        Some(needle) => resolve_chat_id(state, needle).map_err(Into::into),
        None => state
            .current_chat()
            .map(|chat| chat.id.clone())
            .ok_or_else(|| "No chat is selected. Pass a chat id or run 'ollama-chat chat new'.".into()),
    })
}

pub fn run(
    command: ChatCommands,
    store: &SessionStore,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        ChatCommands::New => {
            let id = store.create_chat()?;
            writeln!(out, "✅ Started chat {id}")?;
        }
        ChatCommands::List { search } => list_chats(store, search.as_deref(), out)?,
        ChatCommands::Show { id } => {
            let id = resolve_or_current(store, id.as_deref())?;
            show_chat(store, &id, out)?;
        }
        ChatCommands::Select { id } => {
            let id = store.read(|state| resolve_chat_id(state, &id))?;
            store.select_chat(Some(id.clone()))?;
            writeln!(out, "✅ Selected chat {id}")?;
        }
        ChatCommands::Rename { id, title } => {
            let title = title.join(" ");
            let title = title.trim();
            if title.is_empty() {
                return Err("Title cannot be empty".into());
            }
            let id = store.read(|state| resolve_chat_id(state, &id))?;
            store.rename_chat(&id, title)?;
            writeln!(out, "✅ Renamed chat {id} to: {title}")?;
        }
        ChatCommands::Delete { id } => {
            let id = store.read(|state| resolve_chat_id(state, &id))?;
            store.delete_chat(&id)?;
            writeln!(out, "✅ Deleted chat {id}")?;
        }
        ChatCommands::Clear => {
            let count = store.read(|state| state.chats.len());
            store.delete_all_chats()?;
            writeln!(out, "✅ Deleted {count} chat(s)")?;
        }
        ChatCommands::Export { id, output, force } => {
            let id = resolve_or_current(store, id.as_deref())?;
            export_chat(store, &id, output, force, out)?;
        }
    }
    Ok(())
}

fn list_chats(
    store: &SessionStore,
    search: Option<&str>,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let (rows, current) = store.read(|state| {
        let chats = match search {
            Some(query) => state.search_chats(query),
            None => state.chats.iter().collect(),
        };
        let rows: Vec<(String, String, usize)> = chats
            .into_iter()
            .map(|chat| (chat.id.clone(), chat.title.clone(), chat.messages.len()))
            .collect();
        (rows, state.current_chat().map(|chat| chat.id.clone()))
    });

    if rows.is_empty() {
        match search {
            Some(query) => writeln!(out, "No chats match '{query}'.")?,
            None => writeln!(out, "No chats yet. Run 'ollama-chat chat new' to start one.")?,
        }
        return Ok(());
    }

    writeln!(out, "💬 Chats")?;
    writeln!(out, "━━━━━━━━")?;
    for (id, title, count) in rows {
        let marker = if current.as_deref() == Some(id.as_str()) {
            "*"
        } else {
            " "
        };
        writeln!(out, "{marker} {id}  {title} ({count} messages)")?;
    }
    Ok(())
}

fn show_chat(store: &SessionStore, id: &str, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let chat = store
        .read(|state| state.chat(id).cloned())
        .ok_or_else(|| format!("No chat with id '{id}'"))?;

    writeln!(out, "💬 {}", chat.title)?;
    writeln!(out)?;
    if chat.is_empty() {
        writeln!(out, "(no messages)")?;
    }
    for message in &chat.messages {
        let label = if message.role.is_user() { "You" } else { "Assistant" };
        writeln!(out, "{label}: {}", message.content)?;
        writeln!(out)?;
    }
    Ok(())
}

fn export_chat(
    store: &SessionStore,
    id: &str,
    output: Option<PathBuf>,
    force: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let chat = store
        .read(|state| state.chat(id).cloned())
        .ok_or_else(|| format!("No chat with id '{id}'"))?;
    let path = output.unwrap_or_else(|| PathBuf::from(chat_export_file_name(&chat.title)));
    write_export(&path, &chat_export(&chat, Utc::now()), force)?;
    writeln!(out, "✅ Exported chat to {}", path.display())?;
    Ok(())
}

pub fn export_all(
    store: &SessionStore,
    output: Option<PathBuf>,
    force: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let chats = store.read(|state| state.chats.clone());
    let now = Utc::now();
    let path = output.unwrap_or_else(|| PathBuf::from(chats_export_file_name(now)));
    write_export(&path, &chats_export(&chats, now), force)?;
    writeln!(
        out,
        "✅ Exported {} chat(s) to {}",
        chats.len(),
        path.display()
    )?;
    Ok(())
}
