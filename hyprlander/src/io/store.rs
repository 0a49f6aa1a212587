//! Secret store: a `KEY=VALUE` line file holding the API key and target directory.
//!
//! A store file with non-empty content is the only "initialized" signal.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const API_KEY: &str = "API_KEY";
pub const HYPRLAND_DIR: &str = "HYPRLAND_DIR";

/// Setup problem that prevents a conversation from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("hyprlander is not initialized ({path} is missing or empty); run `hyprlander init` first")]
    NotInitialized { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{key} is not set in {path}; run `hyprlander update`")]
    MissingKey { key: String, path: PathBuf },
    #[error("{path} is not an existing directory")]
    InvalidDirectory { path: PathBuf },
}

/// In-memory copy of the store, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretStore {
    values: BTreeMap<String, String>,
}

impl SecretStore {
    /// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped; a
    /// line without `=` is ignored. Values may themselves contain `=`.
    pub fn parse(contents: &str) -> Self {
        let values = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { values }
    }

    pub fn render(&self) -> String {
        self.values
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Look up a key that must hold a non-empty value.
    pub fn require(&self, key: &str, path: &Path) -> Result<&str, ConfigError> {
        self.get(key)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingKey {
                key: key.to_string(),
                path: path.to_path_buf(),
            })
    }
}

/// True when the store file exists with non-empty content.
pub fn is_initialized(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|contents| !contents.is_empty())
        .unwrap_or(false)
}

pub fn load_store(path: &Path) -> Result<SecretStore, ConfigError> {
    debug!(path = %path.display(), "loading secret store");
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotInitialized {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if contents.is_empty() {
        return Err(ConfigError::NotInitialized {
            path: path.to_path_buf(),
        });
    }
    Ok(SecretStore::parse(&contents))
}

/// Atomically write the store (temp file + rename), owner-only on unix.
pub fn write_store(path: &Path, store: &SecretStore) -> Result<(), ConfigError> {
    let unwritable = |source| ConfigError::Unwritable {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(unwritable)?;
    }
    let tmp_path = path.with_extension("ini.tmp");
    fs::write(&tmp_path, store.render()).map_err(unwritable)?;
    restrict_permissions(&tmp_path).map_err(unwritable)?;
    fs::rename(&tmp_path, path).map_err(unwritable)?;
    debug!(path = %path.display(), "secret store written");
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Verify that `path` names an existing directory.
pub fn ensure_directory(path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::InvalidDirectory {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_keeps_equals_in_values() {
        let store = SecretStore::parse(
            "# hyprlander\nAPI_KEY = abc=def\n\nHYPRLAND_DIR=/home/u/.config/hypr\nnoise\n",
        );
        assert_eq!(store.get(API_KEY), Some("abc=def"));
        assert_eq!(store.get(HYPRLAND_DIR), Some("/home/u/.config/hypr"));
        assert_eq!(store.keys().count(), 2);
    }

    #[test]
    fn render_is_sorted_key_value_lines() {
        let mut store = SecretStore::default();
        store.set(HYPRLAND_DIR, "/hypr");
        store.set(API_KEY, "k");
        assert_eq!(store.render(), "API_KEY=k\nHYPRLAND_DIR=/hypr\n");
    }

    #[test]
    fn missing_file_is_not_initialized() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("secrets.ini");
        assert!(!is_initialized(&path));
        assert!(matches!(
            load_store(&path),
            Err(ConfigError::NotInitialized { .. })
        ));
    }

    #[test]
    fn empty_file_is_not_initialized() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("secrets.ini");
        fs::write(&path, "").expect("write");
        assert!(!is_initialized(&path));
        assert!(matches!(
            load_store(&path),
            Err(ConfigError::NotInitialized { .. })
        ));
    }

    #[test]
    fn whitespace_only_file_counts_as_initialized() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("secrets.ini");
        fs::write(&path, "\n  \n").expect("write");
        assert!(is_initialized(&path));
        let store = load_store(&path).expect("load");
        assert!(matches!(
            store.require(API_KEY, &path),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn write_then_load_preserves_values() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/secrets.ini");
        let mut store = SecretStore::default();
        store.set(API_KEY, "secret");
        write_store(&path, &store).expect("write");

        assert!(is_initialized(&path));
        assert_eq!(load_store(&path).expect("load"), store);
    }

    #[cfg(unix)]
    #[test]
    fn written_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("secrets.ini");
        write_store(&path, &SecretStore::parse("API_KEY=k")).expect("write");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn require_rejects_empty_values() {
        let store = SecretStore::parse("API_KEY=\n");
        let err = store.require(API_KEY, Path::new("secrets.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }
}
