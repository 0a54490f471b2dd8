//! Session store: chats, the current-chat pointer, and settings.
//!
//! [`SessionState`] is plain data whose methods are the reducer steps.
//! [`SessionStore`] owns one state behind a mutex, applies those steps, and
//! writes the full snapshot to [`StateStorage`] after each one.

use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::api::{ModelDescriptor, ModelRegistry};
use crate::core::chat::{generate_id, ChatThread};
use crate::core::message::Message;
use crate::core::settings::{NewServer, ServerEntry, Settings, SettingsPatch};
use crate::core::storage::{StateStorage, StorageError};

#[derive(Debug)]
pub enum StoreError {
    /// A server with the same url and port is already registered.
    DuplicateServer { url: String, port: u16 },
    /// The registry must keep at least one server.
    LastServer,
    Persist(StorageError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateServer { url, port } => write!(
                f,
                "A server with this URL and port already exists ({url}:{port})."
            ),
            StoreError::LastServer => write!(f, "Cannot remove the only configured server."),
            StoreError::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Persist(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::Persist(err)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub chats: Vec<ChatThread>,
    #[serde(default)]
    pub current_chat_id: Option<String>,
    #[serde(default)]
    pub settings: Settings,
}

impl SessionState {
    pub fn chat(&self, id: &str) -> Option<&ChatThread> {
        self.chats.iter().find(|chat| chat.id == id)
    }

    fn chat_mut(&mut self, id: &str) -> Option<&mut ChatThread> {
        self.chats.iter_mut().find(|chat| chat.id == id)
    }

    /// The selected thread; a pointer to a deleted thread reads as none.
    pub fn current_chat(&self) -> Option<&ChatThread> {
        self.current_chat_id
            .as_deref()
            .and_then(|id| self.chat(id))
    }

    pub fn active_server(&self) -> Option<&ServerEntry> {
        self.settings.active_server()
    }

    pub fn search_chats(&self, query: &str) -> Vec<&ChatThread> {
        self.chats
            .iter()
            .filter(|chat| chat.matches_title(query))
            .collect()
    }

    pub fn create_chat(&mut self) -> String {
        let chat = ChatThread::new();
        let id = chat.id.clone();
        self.chats.push(chat);
        self.current_chat_id = Some(id.clone());
        id
    }

    pub fn select_chat(&mut self, id: Option<String>) {
        self.current_chat_id = id;
    }

    /// Returns false when no thread has `chat_id`; nothing changes then.
    pub fn append_message(&mut self, chat_id: &str, message: Message) -> bool {
        match self.chat_mut(chat_id) {
            Some(chat) => {
                chat.messages.push(message);
                true
            }
            None => false,
        }
    }

    pub fn rename_chat(&mut self, chat_id: &str, title: impl Into<String>) -> bool {
        match self.chat_mut(chat_id) {
            Some(chat) => {
                chat.title = title.into();
                true
            }
            None => false,
        }
    }

    pub fn delete_chat(&mut self, chat_id: &str) -> bool {
        let before = self.chats.len();
        self.chats.retain(|chat| chat.id != chat_id);
        if self.current_chat_id.as_deref() == Some(chat_id) {
            self.current_chat_id = None;
        }
        self.chats.len() != before
    }

    pub fn delete_all_chats(&mut self) {
        self.chats.clear();
        self.current_chat_id = None;
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.settings.apply(patch);
    }

    pub fn add_server(&mut self, server: NewServer) -> Result<String, StoreError> {
        let NewServer { name, url, port } = server;
        if self
            .settings
            .servers
            .iter()
            .any(|existing| existing.same_address(&url, port))
        {
            return Err(StoreError::DuplicateServer { url, port });
        }

        let id = generate_id();
        self.settings.servers.push(ServerEntry {
            id: id.clone(),
            name,
            url,
            port,
            models: Vec::new(),
        });
        Ok(id)
    }

    /// Unknown ids are a no-op (`Ok(false)`). Removing the active server moves
    /// the selection to the first remaining entry.
    pub fn remove_server(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.settings.servers.len() <= 1 {
            return Err(StoreError::LastServer);
        }
        let before = self.settings.servers.len();
        self.settings.servers.retain(|server| server.id != id);
        if self.settings.servers.len() == before {
            return Ok(false);
        }
        if self.settings.active_server_id.as_deref() == Some(id) {
            self.settings.active_server_id =
                self.settings.servers.first().map(|server| server.id.clone());
        }
        Ok(true)
    }

    pub fn set_active_server(&mut self, id: Option<String>) {
        self.settings.active_server_id = id;
    }

    pub fn replace_server_models(&mut self, server_id: &str, models: Vec<ModelDescriptor>) -> bool {
        match self
            .settings
            .servers
            .iter_mut()
            .find(|server| server.id == server_id)
        {
            Some(server) => {
                server.models = models;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    UnknownServer,
    /// The model list was replaced; carries the new count.
    Refreshed(usize),
    /// The server could not be queried; existing models were kept.
    Failed,
}

pub struct SessionStore {
    state: Mutex<SessionState>,
    storage: StateStorage,
    registry: Arc<dyn ModelRegistry>,
}

impl SessionStore {
    pub fn new(state: SessionState, storage: StateStorage, registry: Arc<dyn ModelRegistry>) -> Self {
        Self {
            state: Mutex::new(state),
            storage,
            registry,
        }
    }

    /// Rehydrate from storage.
    pub fn open(storage: StateStorage, registry: Arc<dyn ModelRegistry>) -> Result<Self, StorageError> {
        let state = storage.load()?;
        debug!(
            chats = state.chats.len(),
            servers = state.settings.servers.len(),
            "session state loaded"
        );
        Ok(Self::new(state, storage, registry))
    }

    pub fn registry(&self) -> &Arc<dyn ModelRegistry> {
        &self.registry
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn read<T>(&self, reader: impl FnOnce(&SessionState) -> T) -> T {
        reader(&self.lock())
    }

    /// Apply one reducer step and write the resulting snapshot. A step that
    /// returns `Err` leaves the state untouched and is not persisted.
    fn mutate<T>(
        &self,
        step: impl FnOnce(&mut SessionState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.lock();
        let mut working = state.clone();
        let result = step(&mut working)?;
        *state = working;
        self.storage.save(&state)?;
        Ok(result)
    }

    pub fn create_chat(&self) -> Result<String, StoreError> {
        self.mutate(|state| Ok(state.create_chat()))
    }

    pub fn select_chat(&self, id: Option<String>) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.select_chat(id);
            Ok(())
        })
    }

    pub fn append_message(&self, chat_id: &str, message: Message) -> Result<bool, StoreError> {
        self.mutate(|state| Ok(state.append_message(chat_id, message)))
    }

    pub fn rename_chat(&self, chat_id: &str, title: impl Into<String>) -> Result<bool, StoreError> {
        self.mutate(|state| Ok(state.rename_chat(chat_id, title)))
    }

    pub fn delete_chat(&self, chat_id: &str) -> Result<bool, StoreError> {
        self.mutate(|state| Ok(state.delete_chat(chat_id)))
    }

    pub fn delete_all_chats(&self) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.delete_all_chats();
            Ok(())
        })
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.update_settings(patch);
            Ok(())
        })
    }

    pub fn add_server(&self, server: NewServer) -> Result<String, StoreError> {
        self.mutate(|state| state.add_server(server))
    }

    pub fn remove_server(&self, id: &str) -> Result<bool, StoreError> {
        self.mutate(|state| state.remove_server(id))
    }

    pub fn set_active_server(&self, id: Option<String>) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.set_active_server(id);
            Ok(())
        })
    }

    /// Fetch the server's model list and replace the cached one. The lock is
    /// released across the request, so refreshes of different servers do not
    /// wait on each other. A response that arrives after the server was
    /// removed is dropped.
    pub async fn refresh_server_models(&self, server_id: &str) -> Result<RefreshOutcome, StoreError> {
        let Some(base_url) = self.read(|state| state.settings.server(server_id).map(ServerEntry::base_url))
        else {
            return Ok(RefreshOutcome::UnknownServer);
        };

        match self.registry.list_models(&base_url).await {
            Ok(models) => {
                let count = models.len();
                let applied = self.mutate(|state| Ok(state.replace_server_models(server_id, models)))?;
                if applied {
                    debug!(server_id, count, "model list refreshed");
                    Ok(RefreshOutcome::Refreshed(count))
                } else {
                    Ok(RefreshOutcome::UnknownServer)
                }
            }
            Err(err) => {
                error!(server_id, error = %err, "Failed to refresh models");
                Ok(RefreshOutcome::Failed)
            }
        }
    }
}
