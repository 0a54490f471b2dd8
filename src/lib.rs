//! ollama-chat is a command-line chat client for Ollama-compatible servers.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the session state: chat threads, the current-chat pointer,
//!   the server registry and settings, their persistence, and the submit flow
//!   that names threads and records completions.
//! - [`api`] defines the Ollama payloads and the HTTP client behind the
//!   [`api::ModelRegistry`] trait.
//! - [`cli`] parses arguments and drives the store for each subcommand.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod logging;
pub mod utils;
