//! JSON exports of one thread or the whole chat list.

use std::error::Error as StdError;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::core::chat::ChatThread;
use crate::core::message::Message;

#[derive(Debug)]
pub enum ExportError {
    AlreadyExists(PathBuf),
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::AlreadyExists(path) => write!(
                f,
                "File '{}' already exists. Choose another name or pass --force.",
                path.display()
            ),
            ExportError::Io(err) => write!(f, "{err}"),
            ExportError::Serialize(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for ExportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ExportError::AlreadyExists(_) => None,
            ExportError::Io(err) => Some(err),
            ExportError::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialize(err)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExport<'a> {
    pub title: &'a str,
    pub messages: &'a [Message],
    pub export_date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatsExport<'a> {
    pub chats: &'a [ChatThread],
    pub export_date: String,
}

fn export_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn chat_export(chat: &ChatThread, now: DateTime<Utc>) -> ChatExport<'_> {
    ChatExport {
        title: &chat.title,
        messages: &chat.messages,
        export_date: export_timestamp(now),
    }
}

pub fn chats_export(chats: &[ChatThread], now: DateTime<Utc>) -> ChatsExport<'_> {
    ChatsExport {
        chats,
        export_date: export_timestamp(now),
    }
}

/// `"Bread & Butter"` → `bread___butter_export.json`
pub fn chat_export_file_name(title: &str) -> String {
    let slug: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase();
    format!("{slug}_export.json")
}

/// The stamp avoids `:` so the name is valid on every platform.
pub fn chats_export_file_name(now: DateTime<Utc>) -> String {
    format!("chats_export_{}.json", now.format("%Y-%m-%dT%H-%M-%S%.3fZ"))
}

/// Write pretty-printed JSON, refusing to clobber an existing file unless
/// `overwrite` is set.
pub fn write_export<T: Serialize>(
    path: &Path,
    export: &T,
    overwrite: bool,
) -> Result<(), ExportError> {
    if !overwrite && path.exists() {
        return Err(ExportError::AlreadyExists(path.to_path_buf()));
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, export)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
