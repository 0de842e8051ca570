//! Configuration loading.
//!
//! Lookup order: an explicit `--config` path, the nearest
//! `.tangle/config.json` in the working directory or one of its
//! ancestors, the user config directory, then built-in defaults. Missing
//! fields fall back to their defaults, so a config file only needs the
//! values it changes.
//!
//! A relative `store_path` in a project-local config is taken relative
//! to the project root (the directory holding `.tangle`), so commands
//! work from any subdirectory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tangle_core::EdgeKind;
use tangle_graph::GroupBy;
use thiserror::Error;
use tracing::debug;

/// Directory created by `tangle init`.
pub const LOCAL_DIR: &str = ".tangle";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the sled database lives.
    pub store_path: PathBuf,
    /// Edge kind the index is built from.
    pub edge_kind: EdgeKind,
    pub depth: usize,
    pub max_hops: usize,
    pub limit: usize,
    pub max_nodes: usize,
    pub group_by: GroupBy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: Path::new(LOCAL_DIR).join("db"),
            edge_kind: EdgeKind::Imports,
            depth: 3,
            max_hops: 6,
            limit: 10,
            max_nodes: 200,
            group_by: GroupBy::Parent,
        }
    }
}

impl Config {
    /// Resolves and loads the configuration.
    ///
    /// An explicit path must exist; the implicit locations are skipped
    /// when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        for path in implicit_locations() {
            if path.is_file() {
                return Self::read(&path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Reads one config file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(root) = project_root(path) {
            if config.store_path.is_relative() {
                config.store_path = root.join(&config.store_path);
            }
        }
        debug!(
            "Loaded config from {} (store at {})",
            path.display(),
            config.store_path.display()
        );
        Ok(config)
    }

    /// Writes the config as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_error)
    }
}

/// Project-local config path under `root`.
pub fn local_path(root: &Path) -> PathBuf {
    root.join(LOCAL_DIR).join(CONFIG_FILE)
}

/// The directory holding `.tangle` when `config_path` is a
/// project-local config.
fn project_root(config_path: &Path) -> Option<&Path> {
    let dir = config_path.parent()?;
    if dir.file_name()? != std::ffi::OsStr::new(LOCAL_DIR) {
        return None;
    }
    dir.parent()
}

/// The nearest project-local config at or above `start`.
pub fn find_local(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(local_path)
        .find(|path| path.is_file())
}

fn implicit_locations() -> Vec<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut locations: Vec<PathBuf> = find_local(&cwd).into_iter().collect();
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("tangle").join(CONFIG_FILE));
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"depth": 5, "group_by": "top_level"}"#).unwrap();
        assert_eq!(config.depth, 5);
        assert_eq!(config.group_by, GroupBy::TopLevel);
        assert_eq!(config.max_hops, 6);
        assert_eq!(config.edge_kind, EdgeKind::Imports);
        assert_eq!(config.store_path, PathBuf::from(".tangle/db"));
    }

    #[test]
    fn test_write_then_load_explicit() {
        let dir = tempdir().unwrap();
        let path = local_path(dir.path());

        let config = Config {
            limit: 25,
            edge_kind: EdgeKind::Calls,
            ..Config::default()
        };
        config.write(&path).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_local_store_path_is_relative_to_project_root() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("proj");
        Config::default().write(&local_path(&project)).unwrap();

        let config = Config::read(&local_path(&project)).unwrap();
        assert_eq!(config.store_path, project.join(".tangle").join("db"));
    }

    #[test]
    fn test_other_configs_keep_store_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tangle.json");
        Config::default().write(&path).unwrap();

        let config = Config::read(&path).unwrap();
        assert_eq!(config.store_path, PathBuf::from(".tangle/db"));
    }

    #[test]
    fn test_find_local_walks_up() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("proj");
        let nested = project.join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();
        assert!(find_local(&nested).is_none());

        Config::default().write(&local_path(&project)).unwrap();
        assert_eq!(find_local(&nested), Some(local_path(&project)));
        assert_eq!(find_local(&project), Some(local_path(&project)));
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::read(&path), Err(ConfigError::Json { .. })));
    }
}
