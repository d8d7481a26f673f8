//! Config loading and persistence.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{BackoffPolicy, PollingConfig};
use crate::core::Limits;
use crate::error::{Effect, Transience};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base poll interval for foreground readers, seconds.
    pub refresh_interval_secs: u64,
    /// Shorter base interval while developing.
    pub debug_refresh_interval_secs: u64,
    /// Poll interval while the tab/window is out of focus, seconds.
    pub background_interval_secs: u64,
    /// Consecutive failures per backoff step.
    pub delay_threshold: u32,
    /// Interval factor applied at the first backoff step.
    pub delay_multiplier: u32,
    /// Consecutive failures that trip the poll circuit breaker.
    pub max_consecutive_retries: u32,
    /// Per-fetch timeout, seconds. Expiry counts as a failure.
    pub fetch_timeout_secs: u64,
    /// Prefix for per-entry share links; the canonical id is appended
    /// as a fragment.
    pub share_base_url: String,
    pub limits: Limits,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 10,
            debug_refresh_interval_secs: 2,
            background_interval_secs: 60,
            delay_threshold: 5,
            delay_multiplier: 2,
            max_consecutive_retries: 100,
            fetch_timeout_secs: 30,
            share_base_url: String::new(),
            limits: Limits::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Polling knobs for a controller instance.
    pub fn polling(&self, debug: bool) -> PollingConfig {
        let base = if debug {
            self.debug_refresh_interval_secs
        } else {
            self.refresh_interval_secs
        };
        PollingConfig {
            policy: BackoffPolicy {
                base: Duration::from_secs(base),
                background: Duration::from_secs(self.background_interval_secs),
                delay_threshold: self.delay_threshold,
                delay_multiplier: self.delay_multiplier,
                max_consecutive_retries: self.max_consecutive_retries,
            },
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 0 = info, 1 = debug, 2+ = trace.
    pub verbosity: u8,
    pub file: FileLoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

impl ConfigError {
    pub fn transience(&self) -> Transience {
        match self {
            ConfigError::Parse { .. } => Transience::Permanent,
            _ => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            ConfigError::Write { .. } => Effect::Unknown,
            _ => Effect::None,
        }
    }
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load the config, falling back to defaults (and writing them out) when
/// the file is missing or broken.
pub fn load_or_init(path: &Path) -> Config {
    if path.exists() {
        match load(path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                tracing::warn!("config load failed, using defaults: {e}");
                return Config::default();
            }
        }
    }

    let cfg = Config::default();
    if let Err(e) = write_config(path, &cfg) {
        tracing::warn!("failed to write default config: {e}");
    }
    cfg
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let write_err = |reason: String| ConfigError::Write {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| write_err(e.to_string()))?;
    }
    let contents =
        toml::to_string_pretty(cfg).map_err(|e| write_err(format!("render failed: {e}")))?;
    atomic_write(path, contents.as_bytes())
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let write_err = |reason: String| ConfigError::Write {
        path: path.to_path_buf(),
        reason,
    };

    let dir = path
        .parent()
        .ok_or_else(|| write_err("missing parent directory".to_string()))?;
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_err(e.to_string()))?;
    fs::write(temp.path(), data).map_err(|e| write_err(e.to_string()))?;
    temp.persist(path).map_err(|e| write_err(e.to_string()))?;
    Ok(())
}
