use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Keys accepted by `config set` / `config unset`.
pub const CONFIG_KEYS: [&str; 4] = [
    "state-file",
    "default-model",
    "request-timeout-secs",
    "log-level",
];

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the session snapshot is stored; defaults to the platform data dir
    pub state_file: Option<PathBuf>,
    /// Model used by `send` when none is given on the command line
    pub default_model: Option<String>,
    /// Per-request timeout for calls to Ollama servers
    pub request_timeout_secs: Option<u64>,
    /// Tracing filter used when RUST_LOG is unset (e.g., "info", "ollama_chat=debug")
    pub log_level: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.local/share/ollama-chat/state.json` → `~/.local/share/ollama-chat/state.json`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "state-file" => self.state_file = Some(PathBuf::from(value)),
            "default-model" => self.default_model = Some(value.to_string()),
            "request-timeout-secs" => {
                let secs = value
                    .parse::<u64>()
                    .map_err(|_| format!("request-timeout-secs must be a whole number, got '{value}'"))?;
                self.request_timeout_secs = Some(secs);
            }
            "log-level" => self.log_level = Some(value.to_string()),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        match key {
            "state-file" => self.state_file = None,
            "default-model" => self.default_model = None,
            "request-timeout-secs" => self.request_timeout_secs = None,
            "log-level" => self.log_level = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {key} (expected one of: {})",
        CONFIG_KEYS.join(", ")
    )
}
