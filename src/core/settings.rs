use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::ModelDescriptor;
use crate::utils::url::server_base_url;

pub const DEFAULT_SERVER_ID: &str = "default";
pub const DEFAULT_SERVER_NAME: &str = "Local Ollama";
pub const DEFAULT_SERVER_URL: &str = "http://localhost";
pub const DEFAULT_SERVER_PORT: u16 = 11434;

/// A backend registered with the client, plus the model list it last reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub id: String,
    pub name: String,
    pub url: String,
    pub port: u16,
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

impl ServerEntry {
    pub fn base_url(&self) -> String {
        server_base_url(&self.url, self.port)
    }

    pub fn same_address(&self, url: &str, port: u16) -> bool {
        self.url == url && self.port == port
    }
}

/// Input for registering a server; the store assigns the id and model list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServer {
    pub name: String,
    pub url: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Sm,
    #[default]
    Base,
    Lg,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl FontSize {
    pub fn as_str(self) -> &'static str {
        match self {
            FontSize::Sm => "sm",
            FontSize::Base => "base",
            FontSize::Lg => "lg",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(format!(
                "invalid theme '{value}' (expected light, dark or system)"
            )),
        }
    }
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "sm" => Ok(FontSize::Sm),
            "base" => Ok(FontSize::Base),
            "lg" => Ok(FontSize::Lg),
            _ => Err(format!(
                "invalid font size '{value}' (expected sm, base or lg)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceSettings {
    pub theme: Theme,
    pub font_size: FontSize,
}

/// Stored but never read by the chat logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub servers: Vec<ServerEntry>,
    pub active_server_id: Option<String>,
    #[serde(default)]
    pub appearance: AppearanceSettings,
    #[serde(default)]
    pub github: GithubCredentials,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            servers: vec![ServerEntry {
                id: DEFAULT_SERVER_ID.to_string(),
                name: DEFAULT_SERVER_NAME.to_string(),
                url: DEFAULT_SERVER_URL.to_string(),
                port: DEFAULT_SERVER_PORT,
                models: Vec::new(),
            }],
            active_server_id: Some(DEFAULT_SERVER_ID.to_string()),
            appearance: AppearanceSettings::default(),
            github: GithubCredentials::default(),
        }
    }
}

impl Settings {
    pub fn server(&self, id: &str) -> Option<&ServerEntry> {
        self.servers.iter().find(|server| server.id == id)
    }

    /// The selected server; an id that matches no entry reads as none.
    pub fn active_server(&self) -> Option<&ServerEntry> {
        self.active_server_id
            .as_deref()
            .and_then(|id| self.server(id))
    }

    /// Shallow merge: each provided field replaces the current one whole.
    pub fn apply(&mut self, patch: SettingsPatch) {
        let SettingsPatch {
            active_server_id,
            appearance,
            github,
        } = patch;
        if let Some(active_server_id) = active_server_id {
            self.active_server_id = active_server_id;
        }
        if let Some(appearance) = appearance {
            self.appearance = appearance;
        }
        if let Some(github) = github {
            self.github = github;
        }
    }
}

/// Partial settings for [`Settings::apply`]. `active_server_id` is doubly
/// optional so a patch can clear the selection. The server list is not
/// patchable; it changes only through `add_server` and `remove_server`, which
/// keep it non-empty and free of duplicate addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub active_server_id: Option<Option<String>>,
    pub appearance: Option<AppearanceSettings>,
    pub github: Option<GithubCredentials>,
}
