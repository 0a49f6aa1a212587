//! Canonical locations of hyprlander's files.

use std::path::PathBuf;

use anyhow::{Result, anyhow};

/// Directory name under the user cache directory.
pub const APP_DIR_NAME: &str = ".hyprlander";
/// Environment variable overriding the application directory.
pub const HOME_ENV: &str = "HYPRLANDER_HOME";

/// All canonical paths for one application directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub app_dir: PathBuf,
    pub secrets_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        let app_dir = app_dir.into();
        Self {
            secrets_path: app_dir.join("secrets.ini"),
            config_path: app_dir.join("config.toml"),
            app_dir,
        }
    }

    /// Resolve from `HYPRLANDER_HOME`, falling back to `<cache dir>/.hyprlander`.
    pub fn discover() -> Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::new(home));
        }
        let cache = dirs::cache_dir()
            .ok_or_else(|| anyhow!("could not determine the user cache directory"))?;
        Ok(Self::new(cache.join(APP_DIR_NAME)))
    }
}

/// Default Hyprland configuration directory offered during `init`.
pub fn default_hyprland_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hypr"))
}
