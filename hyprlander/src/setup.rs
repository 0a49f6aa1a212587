//! `hyprlander init` and `hyprlander update`.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::io::config::{AgentConfig, write_config};
use crate::io::paths::{AppPaths, default_hyprland_dir};
use crate::io::store::{
    API_KEY, HYPRLAND_DIR, SecretStore, ensure_directory, is_initialized, load_store, write_store,
};
use crate::io::ui::Ui;

/// Result of `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyInitialized,
}

/// Create the secret store (and a default `config.toml` when missing).
pub fn init_store<U: Ui>(ui: &mut U, paths: &AppPaths, force: bool) -> Result<InitOutcome> {
    if !force && is_initialized(&paths.secrets_path) {
        ui.print_warning(&format!(
            "Already initialized at {}. Use `hyprlander update` to change a value or `init --force` to start over.",
            paths.secrets_path.display()
        ))?;
        return Ok(InitOutcome::AlreadyInitialized);
    }

    ui.print_title("hyprlander setup")?;
    let api_key = ui.input_required("Gemini API key")?;
    let default_dir = default_hyprland_dir();
    let hyprland_dir = read_directory(ui, "Hyprland config directory", default_dir.as_deref())?;

    let mut store = SecretStore::default();
    store.set(API_KEY, api_key);
    store.set(HYPRLAND_DIR, hyprland_dir.to_string_lossy());
    write_store(&paths.secrets_path, &store)?;
    if !paths.config_path.exists() {
        write_config(&paths.config_path, &AgentConfig::default())?;
        debug!(path = %paths.config_path.display(), "wrote default agent config");
    }

    info!(app_dir = %paths.app_dir.display(), "initialized");
    ui.print_success(&format!("Saved settings to {}", paths.secrets_path.display()))?;
    Ok(InitOutcome::Created)
}

/// Replace one stored value chosen from a menu of the existing keys.
pub fn update_store<U: Ui>(ui: &mut U, paths: &AppPaths) -> Result<String> {
    let mut store = load_store(&paths.secrets_path)?;
    let keys: Vec<String> = store.keys().map(str::to_string).collect();
    if keys.is_empty() {
        bail!(
            "{} holds no values; run `hyprlander init --force`",
            paths.secrets_path.display()
        );
    }
    let index = ui.select("Which value do you want to update?", &keys)?;
    let key = keys[index].clone();

    let value = if key == HYPRLAND_DIR {
        read_directory(ui, &format!("New value for {key}"), None)?
            .to_string_lossy()
            .into_owned()
    } else {
        ui.input_required(&format!("New value for {key}"))?
    };
    store.set(key.clone(), value);
    write_store(&paths.secrets_path, &store)?;

    info!(key = %key, "updated stored value");
    ui.print_success(&format!("Updated {key}."))?;
    Ok(key)
}

/// Prompt until the answer names an existing directory. A blank answer takes
/// `default` when one is offered.
fn read_directory<U: Ui>(ui: &mut U, prompt: &str, default: Option<&Path>) -> Result<PathBuf> {
    loop {
        let answer = match default {
            Some(default) => {
                let raw = ui.input(&format!("{prompt} [{}]", default.display()))?;
                if raw.trim().is_empty() {
                    default.to_path_buf()
                } else {
                    expand_home(raw.trim())
                }
            }
            None => expand_home(&ui.input_required(prompt)?),
        };
        match ensure_directory(&answer) {
            Ok(()) => return Ok(answer),
            Err(err) => ui.print_error(&err.to_string())?,
        }
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (raw, home) {
        ("~", Some(home)) => home,
        (path, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        (path, _) => PathBuf::from(path),
    }
}
