//! Model listing and deletion
//!
//! Listings come from the cached registry entry; `--refresh` queries the
//! server first.

use std::error::Error;
use std::io::Write;

use chrono::{DateTime, Utc};

use crate::api::ModelDescriptor;
use crate::cli::servers::{refresh_servers, target_server_id};
use crate::cli::ModelCommands;
use crate::core::store::SessionStore;

pub async fn run(
    command: ModelCommands,
    store: &SessionStore,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        ModelCommands::List { server, refresh } => {
            let id = target_server_id(store, server.as_deref())?;
            if refresh {
                refresh_servers(store, std::slice::from_ref(&id), out).await?;
                writeln!(out)?;
            }
            list_models(store, &id, out)
        }
        ModelCommands::Delete { model, server } => {
            let id = target_server_id(store, server.as_deref())?;
            delete_model(store, &id, &model, out).await
        }
    }
}

fn list_models(store: &SessionStore, server_id: &str, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let server = store
        .read(|state| state.settings.server(server_id).cloned())
        .ok_or_else(|| format!("No server with id '{server_id}'"))?;

    writeln!(out, "🤖 Models on {} ({})", server.name, server.base_url())?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(out)?;

    if server.models.is_empty() {
        writeln!(
            out,
            "No models cached. Run 'ollama-chat models list --refresh' to fetch them."
        )?;
        return Ok(());
    }

    for model in &server.models {
        writeln!(out, "  • {}", describe_model(model))?;
    }
    Ok(())
}

/// One-line summary: name, then parameter size, quantization, size on disk,
/// and modification date where known.
pub fn describe_model(model: &ModelDescriptor) -> String {
    let mut parts = Vec::new();
    if !model.details.parameter_size.is_empty() {
        parts.push(model.details.parameter_size.clone());
    }
    if !model.details.quantization_level.is_empty() {
        parts.push(model.details.quantization_level.clone());
    }
    if model.size > 0 {
        parts.push(format_size(model.size));
    }
    if let Ok(modified) = DateTime::parse_from_rfc3339(&model.modified_at) {
        let modified: DateTime<Utc> = modified.with_timezone(&Utc);
        parts.push(format!("modified {}", modified.format("%Y-%m-%d")));
    }

    if parts.is_empty() {
        model.name.clone()
    } else {
        format!("{} ({})", model.name, parts.join(", "))
    }
}

fn format_size(bytes: u64) -> String {
    const GB: f64 = 1_000_000_000.0;
    const MB: f64 = 1_000_000.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.1} MB", bytes / MB)
    }
}

async fn delete_model(
    store: &SessionStore,
    server_id: &str,
    model: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let base_url = store
        .read(|state| state.settings.server(server_id).map(|server| server.base_url()))
        .ok_or_else(|| format!("No server with id '{server_id}'"))?;

    store.registry().delete_model(&base_url, model).await?;
    writeln!(out, "✅ Deleted model {model}")?;

    // Keep the cached list in step with the server.
    refresh_servers(store, &[server_id.to_string()], out).await
}
