//! Ledger Storage Configuration
//!
//! This module provides the configuration types used to assemble a node
//! database: which backend holds the bytes and which read cache sits in
//! front of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default number of entries held by a read cache.
pub const DEFAULT_READ_CACHE_SIZE: usize = 1024;

/// Default database name used when none is configured.
pub const DEFAULT_DATABASE_NAME: &str = "default";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for these types.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Storage engine holding the bytes beneath any read cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Sled,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Sled => write!(f, "sled"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" | "mock" => Ok(BackendKind::Memory),
            "sled" | "disk" => Ok(BackendKind::Sled),
            _ => Err(ConfigError::Invalid(format!("unknown backend: {}", s))),
        }
    }
}

/// Read cache placed in front of the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadCacheStrategy {
    /// Reads go straight to the backend.
    None,
    /// Concurrent load-through cache for random-access hot keys.
    #[default]
    Loading,
    /// Insertion-ordered window for records read in ascending order.
    Window,
}

impl fmt::Display for ReadCacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadCacheStrategy::None => write!(f, "none"),
            ReadCacheStrategy::Loading => write!(f, "loading"),
            ReadCacheStrategy::Window => write!(f, "window"),
        }
    }
}

impl FromStr for ReadCacheStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Ok(ReadCacheStrategy::None),
            "loading" | "lru" => Ok(ReadCacheStrategy::Loading),
            "window" | "light" => Ok(ReadCacheStrategy::Window),
            _ => Err(ConfigError::Invalid(format!("unknown read cache: {}", s))),
        }
    }
}

/// Read cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadCacheConfig {
    pub strategy: ReadCacheStrategy,
    /// Maximum cached entries. `0` leaves the loading cache unbounded and is
    /// rejected for the window cache.
    pub max_entries: usize,
    /// Record hit/miss/eviction counters (loading cache only).
    pub enable_stats: bool,
}

impl Default for ReadCacheConfig {
    fn default() -> Self {
        Self {
            strategy: ReadCacheStrategy::Loading,
            max_entries: DEFAULT_READ_CACHE_SIZE,
            enable_stats: false,
        }
    }
}

impl ReadCacheConfig {
    /// Configuration without any read cache.
    pub fn disabled() -> Self {
        Self {
            strategy: ReadCacheStrategy::None,
            ..Self::default()
        }
    }

    /// Loading cache with the given bound.
    pub fn loading(max_entries: usize, enable_stats: bool) -> Self {
        Self {
            strategy: ReadCacheStrategy::Loading,
            max_entries,
            enable_stats,
        }
    }

    /// Window cache with the given bound.
    pub fn window(max_entries: usize) -> Self {
        Self {
            strategy: ReadCacheStrategy::Window,
            max_entries,
            enable_stats: false,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub name: String,
    /// Directory for disk backends; ignored by the memory backend.
    pub path: Option<PathBuf>,
    pub backend: BackendKind,
    pub read_cache: ReadCacheConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DATABASE_NAME.to_string(),
            path: None,
            backend: BackendKind::Memory,
            read_cache: ReadCacheConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// In-memory database with the default read cache.
    pub fn memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sled database stored under `path`.
    pub fn sled(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
            backend: BackendKind::Sled,
            read_cache: ReadCacheConfig::default(),
        }
    }

    /// Replaces the read cache configuration.
    pub fn with_read_cache(mut self, read_cache: ReadCacheConfig) -> Self {
        self.read_cache = read_cache;
        self
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: DatabaseConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Checks the combination of settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("database name is empty".to_string()));
        }

        if self.backend == BackendKind::Sled && self.path.is_none() {
            return Err(ConfigError::Invalid(format!(
                "database '{}' uses the sled backend but has no path",
                self.name
            )));
        }

        if self.read_cache.strategy == ReadCacheStrategy::Window
            && self.read_cache.max_entries == 0
        {
            return Err(ConfigError::Invalid(format!(
                "database '{}' window cache needs max_entries > 0",
                self.name
            )));
        }

        Ok(())
    }
}
