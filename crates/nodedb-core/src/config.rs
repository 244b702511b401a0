//! Configuration system for nodedb.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $NODEDB_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/nodedb/config.toml
//!   3. ~/.config/nodedb/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::query::{NodeQuery, NodeSort, FILTER_DISABLED, HOPS_FILTER_DISABLED};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDbConfig {
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub query: QueryDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file the registry is persisted to.
    pub path: PathBuf,
    /// If false, the registry lives in memory only.
    pub persist: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Local HTTP port. Bound on 127.0.0.1 only.
    pub port: u16,
}

/// Listing parameters used when a caller leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub sort: String,
    pub include_unknown: bool,
    /// -1 = no cap.
    pub hops_away_max: i32,
    /// -1 = no floor.
    pub last_heard_min: i64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("nodes.json"),
            persist: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 9102 }
    }
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            sort: NodeSort::LastHeard.to_string(),
            include_unknown: true,
            hops_away_max: HOPS_FILTER_DISABLED,
            last_heard_min: FILTER_DISABLED,
        }
    }
}

impl QueryDefaults {
    /// Base query built from these defaults, with an empty filter.
    pub fn to_query(&self) -> NodeQuery {
        NodeQuery {
            sort: NodeSort::from(self.sort.as_str()),
            filter: String::new(),
            include_unknown: self.include_unknown,
            hops_away_max: self.hops_away_max,
            last_heard_min: self.last_heard_min,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("nodedb")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("nodedb")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl NodeDbConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            NodeDbConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a config file without applying env overrides.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("NODEDB_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&NodeDbConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply NODEDB_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("NODEDB_STORE__PATH") {
            self.store.path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("NODEDB_STORE__PERSIST") {
            self.store.persist = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("NODEDB_API__PORT") {
            if let Ok(p) = v.parse() {
                self.api.port = p;
            }
        }
        if let Ok(v) = std::env::var("NODEDB_QUERY__SORT") {
            self.query.sort = v;
        }
    }
}
