//! Configuration file
//!
//! `stocktake.json`:
//!
//! ```json
//! {
//!   "data_dir": "./stocktake-data",
//!   "snapshot_file": "backup.json",
//!   "debounce_ms": 2000,
//!   "autosave_interval_secs": 30,
//!   "write_retries": 3,
//!   "retry_backoff_ms": 100,
//!   "default_direction": "IN",
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::RetryPolicy;

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "./stocktake.json";

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write config {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "STOCK_CONFIG_READ",
            ConfigError::Parse { .. } => "STOCK_CONFIG_PARSE",
            ConfigError::Write { .. } => "STOCK_CONFIG_WRITE",
            ConfigError::Invalid(_) => "STOCK_CONFIG_INVALID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the snapshot (required)
    pub data_dir: PathBuf,

    /// Snapshot file name inside `data_dir`
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,

    /// Delay between the last mutation and its autosave
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Periodic autosave interval
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,

    /// Attempts per snapshot or export write
    #[serde(default = "default_write_retries")]
    pub write_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Direction used when a commit does not name one
    #[serde(default = "default_direction")]
    pub default_direction: String,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_snapshot_file() -> String {
    "backup.json".to_string()
}
fn default_debounce_ms() -> u64 {
    2000
}
fn default_autosave_interval_secs() -> u64 {
    30
}
fn default_write_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    100
}
fn default_direction() -> String {
    "IN".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Defaults with the given data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            snapshot_file: default_snapshot_file(),
            debounce_ms: default_debounce_ms(),
            autosave_interval_secs: default_autosave_interval_secs(),
            write_retries: default_write_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            default_direction: default_direction(),
            log_level: default_log_level(),
        }
    }

    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        let name = self.snapshot_file.trim();
        if name.is_empty() || name == "." || name == ".." {
            return Err(ConfigError::Invalid(format!(
                "snapshot_file '{}' is not a file name",
                self.snapshot_file
            )));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(ConfigError::Invalid(format!(
                "snapshot_file '{}' must not contain path separators",
                self.snapshot_file
            )));
        }

        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid("debounce_ms must be > 0".into()));
        }
        if self.autosave_interval_secs == 0 {
            return Err(ConfigError::Invalid("autosave_interval_secs must be > 0".into()));
        }
        if self.write_retries == 0 {
            return Err(ConfigError::Invalid("write_retries must be > 0".into()));
        }

        Ok(())
    }

    /// Write this configuration as pretty JSON. Refuses to overwrite.
    pub fn write_new(&self, path: &Path) -> ConfigResult<()> {
        if path.exists() {
            return Err(ConfigError::Write {
                path: path.to_path_buf(),
                reason: "file already exists".into(),
            });
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.write_retries, Duration::from_millis(self.retry_backoff_ms))
    }
}
