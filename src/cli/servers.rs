//! Server registry commands

use std::error::Error;
use std::io::Write;

use futures_util::future::join_all;

use crate::cli::ServerCommands;
use crate::core::settings::NewServer;
use crate::core::store::{RefreshOutcome, SessionState, SessionStore};

/// Resolve a server by id, falling back to a case-insensitive name match.
pub fn resolve_server_id(state: &SessionState, needle: &str) -> Result<String, String> {
    let servers = &state.settings.servers;
    if let Some(server) = servers.iter().find(|server| server.id == needle) {
        return Ok(server.id.clone());
    }
    let by_name: Vec<_> = servers
        .iter()
        .filter(|server| server.name.eq_ignore_ascii_case(needle))
        .collect();
    match by_name.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(format!(
            "No server named '{needle}'. Run 'ollama-chat server list' to see registered servers."
        )),
        _ => Err(format!("Several servers are named '{needle}'. Use the server id.")),
    }
}

/// The requested server, or the active one when none was named.
pub fn target_server_id(store: &SessionStore, needle: Option<&str>) -> Result<String, Box<dyn Error>> {
    store.read(|state| match needle {
        Some(needle) => resolve_server_id(state, needle).map_err(Into::into),
        None => state
            .active_server()
            .map(|server| server.id.clone())
            .ok_or_else(|| "No active server. Run 'ollama-chat server use <id>' first.".into()),
    })
}

pub async fn run(
    command: ServerCommands,
    store: &SessionStore,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        ServerCommands::Add { name, url, port } => {
            let name = name.trim().to_string();
            let url = url.trim().to_string();
            if name.is_empty() || url.is_empty() {
                return Err("Server name and URL cannot be empty".into());
            }
            let id = store.add_server(NewServer { name, url, port })?;
            writeln!(out, "✅ Added server {id}")?;
        }
        ServerCommands::Remove { id } => {
            let id = store.read(|state| resolve_server_id(state, &id))?;
            store.remove_server(&id)?;
            let active = store.read(|state| state.active_server().map(|server| server.name.clone()));
            writeln!(out, "✅ Removed server {id}")?;
            if let Some(name) = active {
                writeln!(out, "   Active server: {name}")?;
            }
        }
        ServerCommands::List => list_servers(store, out)?,
        ServerCommands::Use { id } => {
            let id = store.read(|state| resolve_server_id(state, &id))?;
            store.set_active_server(Some(id.clone()))?;
            writeln!(out, "✅ Active server set to {id}")?;
        }
        ServerCommands::Refresh { id, all } => {
            let ids = if all {
                store.read(|state| {
                    state
                        .settings
                        .servers
                        .iter()
                        .map(|server| server.id.clone())
                        .collect::<Vec<_>>()
                })
            } else {
                vec![target_server_id(store, id.as_deref())?]
            };
            refresh_servers(store, &ids, out).await?;
        }
    }
    Ok(())
}

fn list_servers(store: &SessionStore, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let settings = store.read(|state| state.settings.clone());

    writeln!(out, "🖥️  Servers")?;
    writeln!(out, "━━━━━━━━━━")?;
    for server in &settings.servers {
        let marker = if settings.active_server_id.as_deref() == Some(server.id.as_str()) {
            "*"
        } else {
            " "
        };
        writeln!(
            out,
            "{marker} {}  {} ({}) - {} model(s)",
            server.id,
            server.name,
            server.base_url(),
            server.models.len()
        )?;
    }
    if settings.active_server().is_none() {
        writeln!(out)?;
        writeln!(out, "⚠️  No active server. Run 'ollama-chat server use <id>'.")?;
    }
    Ok(())
}

/// Refresh each server concurrently and report one line per server.
pub async fn refresh_servers(
    store: &SessionStore,
    ids: &[String],
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let outcomes = join_all(ids.iter().map(|id| store.refresh_server_models(id))).await;
    for (id, outcome) in ids.iter().zip(outcomes) {
        match outcome? {
            RefreshOutcome::Refreshed(count) => writeln!(out, "✅ {id}: {count} model(s)")?,
            RefreshOutcome::Failed => {
                writeln!(out, "❌ {id}: could not reach server; kept cached models")?
            }
            RefreshOutcome::UnknownServer => writeln!(out, "❌ {id}: server no longer exists")?,
        }
    }
    Ok(())
}
