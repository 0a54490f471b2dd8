use std::error::Error;
use std::io::Write;

use crate::cli::SettingsCommands;
use crate::core::settings::{AppearanceSettings, GithubCredentials, SettingsPatch};
use crate::core::store::SessionStore;

pub fn run(
    command: SettingsCommands,
    store: &SessionStore,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let current = store.read(|state| state.settings.clone());
    match command {
        SettingsCommands::Show => {
            writeln!(out, "⚙️  Settings")?;
            writeln!(out, "━━━━━━━━━━━")?;
            let active = current
                .active_server()
                .map(|server| format!("{} ({})", server.name, server.base_url()))
                .unwrap_or_else(|| "(none)".to_string());
            writeln!(out, "  active server: {active}")?;
            writeln!(out, "  servers: {}", current.servers.len())?;
            writeln!(out, "  theme: {}", current.appearance.theme)?;
            writeln!(out, "  font size: {}", current.appearance.font_size)?;
            let github = if current.github.username.is_empty() {
                "(not set)".to_string()
            } else if current.github.token.is_empty() {
                current.github.username.clone()
            } else {
                format!("{} (token stored)", current.github.username)
            };
            writeln!(out, "  github: {github}")?;
        }
        SettingsCommands::Theme { value } => {
            store.update_settings(SettingsPatch {
                appearance: Some(AppearanceSettings {
                    theme: value,
                    ..current.appearance
                }),
                ..Default::default()
            })?;
            writeln!(out, "✅ Theme set to: {value}")?;
        }
        SettingsCommands::FontSize { value } => {
            store.update_settings(SettingsPatch {
                appearance: Some(AppearanceSettings {
                    font_size: value,
                    ..current.appearance
                }),
                ..Default::default()
            })?;
            writeln!(out, "✅ Font size set to: {value}")?;
        }
        SettingsCommands::Github { username, token } => {
            if username.is_none() && token.is_none() {
                return Err("Pass --username and/or --token".into());
            }
            let github = GithubCredentials {
                username: username.unwrap_or(current.github.username),
                token: token.unwrap_or(current.github.token),
            };
            store.update_settings(SettingsPatch {
                github: Some(github),
                ..Default::default()
            })?;
            writeln!(out, "✅ GitHub credentials updated")?;
        }
    }
    Ok(())
}
