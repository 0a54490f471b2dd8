//! Command-line interface parsing and handling
//!
//! Each subcommand opens the session store, applies one operation, and prints
//! the result. Handlers write to a caller-supplied sink so they can be tested.

pub mod chats;
pub mod model_list;
pub mod send;
pub mod servers;
pub mod settings;

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::api::OllamaClient;
use crate::core::config::data::path_display;
use crate::core::config::Config;
use crate::core::settings::{FontSize, Theme, DEFAULT_SERVER_PORT};
use crate::core::storage::StateStorage;
use crate::core::store::SessionStore;
use crate::logging::init_tracing;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("VERGEN_GIT_SHA"),
    "\nbuilt: ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    "\nrustc: ",
    env!("VERGEN_RUSTC_SEMVER")
);

#[derive(Parser)]
#[command(name = "ollama-chat")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Chat with Ollama-compatible servers from the terminal")]
#[command(
    long_about = "ollama-chat keeps chat threads, a registry of Ollama servers and their \
models, and appearance settings in a local state file. Every change is written \
back immediately.\n\n\
Quick start:\n\
  ollama-chat server refresh        Fetch models from the active server\n\
  ollama-chat chat new              Start a thread and select it\n\
  ollama-chat send -m llama3 Hi     Send a message to the current thread\n\n\
Environment Variables:\n\
  RUST_LOG              Tracing filter (overrides the log-level config key)\n\
  OLLAMA_CHAT_CONFIG    Path to config.toml"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this state file instead of the configured or default one
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage chat threads
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },
    /// Send a message to a thread and print the reply
    Send {
        /// Thread id or unique id prefix (defaults to the current thread)
        #[arg(short = 'c', long)]
        chat: Option<String>,
        /// Model to use (defaults to the default-model config key)
        #[arg(short = 'm', long)]
        model: Option<String>,
        /// Note an attached file on the message
        #[arg(short = 'a', long, value_name = "FILE")]
        attach: Option<PathBuf>,
        /// Message text
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Manage the server registry
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },
    /// Inspect or delete models on a server
    Models {
        #[command(subcommand)]
        command: ModelCommands,
    },
    /// Show or change appearance and credential settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Export every thread to a JSON file
    ExportAll {
        /// Output file (defaults to chats_export_<timestamp>.json)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        /// Overwrite the output file if it exists
        #[arg(long)]
        force: bool,
    },
    /// Show or change configuration values
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ChatCommands {
    /// Start a new thread and make it current
    New,
    /// List threads
    List {
        /// Only show threads whose title contains this text
        #[arg(short = 's', long)]
        search: Option<String>,
    },
    /// Print a thread's messages (defaults to the current thread)
    Show { id: Option<String> },
    /// Make a thread current
    Select { id: String },
    /// Rename a thread
    Rename {
        id: String,
        #[arg(required = true, trailing_var_arg = true)]
        title: Vec<String>,
    },
    /// Delete a thread
    Delete { id: String },
    /// Delete every thread
    Clear,
    /// Export one thread to a JSON file (defaults to the current thread)
    Export {
        id: Option<String>,
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ServerCommands {
    /// Register a server
    Add {
        name: String,
        url: String,
        #[arg(short = 'p', long, default_value_t = DEFAULT_SERVER_PORT)]
        port: u16,
    },
    /// Remove a server (the last one cannot be removed)
    Remove { id: String },
    /// List registered servers
    List,
    /// Make a server active
    Use { id: String },
    /// Refresh cached model lists (defaults to the active server)
    Refresh {
        id: Option<String>,
        /// Refresh every registered server concurrently
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// List cached models for a server (defaults to the active server)
    List {
        #[arg(short = 's', long)]
        server: Option<String>,
        /// Refresh from the server before listing
        #[arg(short = 'r', long)]
        refresh: bool,
    },
    /// Delete a model from a server
    Delete {
        model: String,
        #[arg(short = 's', long)]
        server: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print current settings
    Show,
    /// Set the theme (light, dark, system)
    Theme { value: Theme },
    /// Set the font size (sm, base, lg)
    FontSize { value: FontSize },
    /// Store GitHub credentials
    Github {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the configuration
    Show,
    /// Set a configuration key
    Set {
        key: String,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration key
    Unset { key: String },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = Config::load()?;
    init_tracing(config.log_level(), args.log.as_deref())?;

    match args.command {
        Commands::Config { command } => run_config(command, config, &mut io::stdout()),
        command => {
            let store = open_store(&config, args.state.as_deref())?;
            let mut out = io::stdout();
            let result = dispatch(command, &store, &config, &mut out).await;
            out.flush()?;
            result
        }
    }
}

pub fn resolve_state_path(
    config: &Config,
    override_path: Option<&Path>,
) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &config.state_file {
        return Ok(path.clone());
    }
    Ok(StateStorage::default_path()?)
}

fn open_store(config: &Config, override_path: Option<&Path>) -> Result<SessionStore, Box<dyn Error>> {
    let path = resolve_state_path(config, override_path)?;
    debug!(path = %path_display(&path), "opening state");
    let client = OllamaClient::with_timeout(config.request_timeout())?;
    Ok(SessionStore::open(StateStorage::file(path), Arc::new(client))?)
}

pub async fn dispatch(
    command: Commands,
    store: &SessionStore,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Chat { command } => chats::run(command, store, out),
        Commands::Send {
            chat,
            model,
            attach,
            message,
        } => {
            let request = send::SendArgs {
                chat,
                model,
                attach,
                message: message.join(" "),
            };
            send::run(request, store, config, out).await
        }
        Commands::Server { command } => servers::run(command, store, out).await,
        Commands::Models { command } => model_list::run(command, store, out).await,
        Commands::Settings { command } => settings::run(command, store, out),
        Commands::ExportAll { output, force } => chats::export_all(store, output, force, out),
        Commands::Config { command } => run_config(command, config.clone(), out),
    }
}

fn run_config(
    command: ConfigCommands,
    mut config: Config,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        ConfigCommands::Show => {
            config.print_all(out)?;
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let value = value.join(" ");
            config.set_value(&key, &value)?;
            config.save()?;
            writeln!(out, "✅ Set {key} to: {value}")?;
            Ok(())
        }
        ConfigCommands::Unset { key } => {
            config.unset_value(&key)?;
            config.save()?;
            writeln!(out, "✅ Unset {key}")?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
