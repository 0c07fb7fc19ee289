use std::io::Write;
use std::path::Path;
use std::{fs, io};

use serde::Serialize as _;
use serde_json as json;
use thiserror::Error;

use crate::context::OperationContext;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("configuration JSON error: {0}")]
    Json(#[from] json::Error),
}

/// Object cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Whether the session caches fetched objects.
    #[serde(default = "enabled")]
    pub enabled: bool,
}

fn enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Repository to open. When unset, the first repository served by the
    /// endpoint is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub cache: CacheConfig,
    /// Context used when a caller does not supply one.
    #[serde(default)]
    pub default_context: OperationContext,
}

impl Config {
    /// Create a configuration for the given repository.
    pub fn new(repository_id: impl ToString) -> Self {
        Self {
            repository_id: Some(repository_id.to_string()),
            ..Self::default()
        }
    }

    /// The default operation context, with caching turned off if the
    /// session cache is disabled.
    pub fn default_context(&self) -> OperationContext {
        self.default_context
            .clone()
            .cache_enabled(self.cache.enabled && self.default_context.cache_enabled)
    }

    /// Initialize a new configuration file. Fails if the path already exists.
    pub fn init(repository_id: impl ToString, path: &Path) -> Result<Self, ConfigError> {
        let cfg = Config::new(repository_id);
        cfg.write(path)?;
        Ok(cfg)
    }

    /// Load a configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cfg: Self = json::from_reader(fs::File::open(path)?)?;

        if !cfg.cache.enabled && cfg.default_context.cache_enabled {
            log::debug!(target: "cmis", "Object cache disabled by configuration");
        }
        Ok(cfg)
    }

    /// Write configuration to disk.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)?;
        let formatter = json::ser::PrettyFormatter::with_indent(b"  ");
        let mut serializer = json::Serializer::with_formatter(&file, formatter);

        self.serialize(&mut serializer)?;
        file.write_all(b"\n")?;
        file.sync_all()?;

        Ok(())
    }
}
