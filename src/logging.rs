//! Tracing setup for the command-line front end.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! `log_level`. Events go to stderr, or to a file when `--log` is given.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::config::data::path_display;

pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(crate::core::config::data::DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. Calling it twice is harmless; the second
/// install is ignored.
pub fn init_tracing(fallback_level: &str, log_file: Option<&Path>) -> Result<(), String> {
    let filter = env_filter(fallback_level);
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| format!("Cannot open log file {}: {err}", path_display(path)))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn invalid_fallback_level_still_builds_filter() {
        let filter = env_filter("not a [valid filter");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn unopenable_log_file_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("missing-dir").join("app.log");
        let err = init_tracing("info", Some(&path)).expect_err("parent dir does not exist");
        assert!(err.starts_with("Cannot open log file"));
    }
}
