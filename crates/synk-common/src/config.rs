//! Configuration types for Synk
//!
//! Every section has sensible defaults, so a config file only needs to name
//! what it overrides:
//!
//! ```toml
//! [metastore]
//! namespace = "notes"
//! data_path = "/var/lib/synk/meta.redb"
//!
//! [metastore.cache]
//! max_entries = 5000
//! ```

use crate::error::{Error, Result};
use crate::hash::{HasherKind, KEY_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynkConfig {
    /// Metadata store configuration
    pub metastore: MetastoreConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl SynkConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.metastore.validate()?;
        Ok(config)
    }

    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

/// Metadata store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MetastoreConfig {
    /// Partition under which record ids are scoped
    pub namespace: String,
    /// Path of the redb database file
    pub data_path: PathBuf,
    /// In-memory cache configuration
    pub cache: CacheConfig,
    /// Hash used for cache keys
    pub hasher: HasherKind,
    /// Number of lock stripes serializing same-id operations
    pub lock_stripes: usize,
    /// Pre-populate the cache when the store is opened
    pub warm_on_open: bool,
}

impl Default for MetastoreConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            data_path: PathBuf::from("./synk/meta.redb"),
            cache: CacheConfig::default(),
            hasher: HasherKind::default(),
            lock_stripes: 64,
            warm_on_open: true,
        }
    }
}

impl MetastoreConfig {
    /// Create config for a namespace stored at the given path
    pub fn with_data_path(data_path: impl AsRef<Path>, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            data_path: data_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Check invariants the store relies on
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(Error::configuration("namespace must not be empty"));
        }
        if self.namespace.contains(KEY_SEPARATOR) {
            return Err(Error::configuration(format!(
                "namespace '{}' must not contain '{KEY_SEPARATOR}'",
                self.namespace
            )));
        }
        if self.cache.max_entries == 0 {
            return Err(Error::configuration("cache.max_entries must be at least 1"));
        }
        if self.lock_stripes == 0 {
            return Err(Error::configuration("lock_stripes must be at least 1"));
        }
        Ok(())
    }
}

/// In-memory cache configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached metadata entries
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
