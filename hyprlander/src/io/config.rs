//! Agent configuration stored in `config.toml` next to the secret store.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::budget::DEFAULT_TURN_LIMIT;

/// Agent configuration (TOML).
///
/// Intended to be edited by hand. Missing fields take their defaults, and a
/// missing file is the same as an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier passed to the model service.
    pub model: String,

    /// Base URL of the model service API.
    pub endpoint: String,

    /// Maximum number of turns per conversation.
    pub max_turns: u32,

    /// HTTP timeout for one model call. Unset waits indefinitely.
    pub request_timeout_secs: Option<u64>,

    /// Kill `shellExecute` children after this many seconds. Unset waits indefinitely.
    pub shell_timeout_secs: Option<u64>,

    /// Keep at most this many bytes of each shell output stream.
    pub tool_output_limit_bytes: usize,

    /// Maximum entries of the configuration tree embedded in the instructions.
    pub tree_max_entries: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_turns: DEFAULT_TURN_LIMIT,
            request_timeout_secs: None,
            shell_timeout_secs: None,
            tool_output_limit_bytes: 100_000,
            tree_max_entries: 400,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(anyhow!("endpoint must be non-empty"));
        }
        if self.max_turns == 0 {
            return Err(anyhow!("max_turns must be > 0"));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(anyhow!("request_timeout_secs must be > 0 when set"));
        }
        if self.shell_timeout_secs == Some(0) {
            return Err(anyhow!("shell_timeout_secs must be > 0 when set"));
        }
        if self.tool_output_limit_bytes == 0 {
            return Err(anyhow!("tool_output_limit_bytes must be > 0"));
        }
        if self.tree_max_entries == 0 {
            return Err(anyhow!("tree_max_entries must be > 0"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn shell_timeout(&self) -> Option<Duration> {
        self.shell_timeout_secs.map(Duration::from_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if !path.exists() {
        let cfg = AgentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AgentConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AgentConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, AgentConfig::default());
        assert_eq!(cfg.max_turns, 10);
        assert_eq!(cfg.shell_timeout(), None);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = AgentConfig {
            shell_timeout_secs: Some(30),
            ..AgentConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_turns = 4\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_turns, 4);
        assert_eq!(cfg.model, "gemini-2.5-flash");
    }

    #[test]
    fn zero_turns_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_turns = 0\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("max_turns"));
    }
}
