//! Durable storage for the session snapshot.
//!
//! The whole state lives in one named record that is read once at startup and
//! overwritten wholesale after every mutation.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::data::path_display;
use crate::core::store::SessionState;
use crate::utils::fs::write_atomically;

pub const STORAGE_RECORD_NAME: &str = "ollama-chat-storage";
const STORAGE_VERSION: u32 = 0;

#[derive(Debug)]
pub enum StorageError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: Box<dyn StdError + Send + Sync>,
    },
    NoDataDir,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Read { path, source } => {
                write!(f, "Failed to read state at {}: {}", path_display(path), source)
            }
            StorageError::Parse { path, source } => {
                write!(f, "Failed to parse state at {}: {}", path_display(path), source)
            }
            StorageError::Write { path, source } => {
                write!(f, "Failed to write state to {}: {}", path_display(path), source)
            }
            StorageError::NoDataDir => write!(f, "Failed to determine data directory"),
        }
    }
}

impl StdError for StorageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StorageError::Read { source, .. } => Some(source),
            StorageError::Parse { source, .. } => Some(source),
            StorageError::Write { source, .. } => Some(source.as_ref()),
            StorageError::NoDataDir => None,
        }
    }
}

/// On-disk envelope around the state.
#[derive(Serialize, Deserialize)]
struct PersistedRecord {
    state: SessionState,
    #[serde(default)]
    version: u32,
}

#[derive(Serialize)]
struct PersistedRecordRef<'a> {
    state: &'a SessionState,
    version: u32,
}

/// Where snapshots go. `Memory` keeps nothing and is used when no durable
/// location is wanted (tests, dry runs).
#[derive(Debug, Clone)]
pub enum StateStorage {
    File(PathBuf),
    Memory,
}

impl StateStorage {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StateStorage::File(path.into())
    }

    pub fn default_path() -> Result<PathBuf, StorageError> {
        let proj_dirs = ProjectDirs::from("org", "ollama-chat", "ollama-chat")
            .ok_or(StorageError::NoDataDir)?;
        Ok(proj_dirs
            .data_dir()
            .join(format!("{STORAGE_RECORD_NAME}.json")))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            StateStorage::File(path) => Some(path),
            StateStorage::Memory => None,
        }
    }

    /// Missing record → default state.
    pub fn load(&self) -> Result<SessionState, StorageError> {
        let StateStorage::File(path) = self else {
            return Ok(SessionState::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "no saved state; starting fresh");
            return Ok(SessionState::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| StorageError::Read {
            path: path.clone(),
            source,
        })?;
        let record: PersistedRecord =
            serde_json::from_str(&contents).map_err(|source| StorageError::Parse {
                path: path.clone(),
                source,
            })?;
        Ok(record.state)
    }

    pub fn save(&self, state: &SessionState) -> Result<(), StorageError> {
        let StateStorage::File(path) = self else {
            return Ok(());
        };
        let record = PersistedRecordRef {
            state,
            version: STORAGE_VERSION,
        };
        let contents = serde_json::to_vec(&record).map_err(|source| StorageError::Write {
            path: path.clone(),
            source: Box::new(source),
        })?;
        write_atomically(path, &contents).map_err(|source| StorageError::Write {
            path: path.clone(),
            source: Box::new(source),
        })?;
        debug!(path = %path.display(), chats = state.chats.len(), "state saved");
        Ok(())
    }
}
