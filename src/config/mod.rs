//! Configuration management for the raft store.
//!
//! Loading order, later sources win:
//! 1. Default values (hardcoded)
//! 2. Optional TOML config file
//! 3. Environment variables prefixed with `RAFT_STORE`, nested with `__`
//!    (e.g. `RAFT_STORE__MAINTENANCE__RECLAIM_RATIO=0.5`)

use std::env;
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[cfg(test)]
mod config_test;

pub(crate) const ENV_PREFIX: &str = "RAFT_STORE";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Root directory of the on-disk store. Defaults to a folder below the
    /// system temp dir.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Embedded engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// Background reclamation and durability sync
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            engine: EngineConfig::default(),
            maintenance: MaintenanceConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Default settings rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Load configuration from defaults, an optional TOML file and
    /// `RAFT_STORE__*` environment variables, in that priority order.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a TOML file; it must exist when given
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "data_dir path cannot be empty".into(),
            )));
        }

        self.engine.validate()?;
        self.maintenance.validate()?;

        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    env::temp_dir().join("sled-raft-store")
}

/// Sled tuning plus the transaction budget enforced by the engine adapter.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Page cache size in bytes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    #[serde(default = "default_use_compression")]
    pub use_compression: bool,

    /// zstd level, 1..=22
    #[serde(default = "default_compression_factor")]
    pub compression_factor: i32,

    /// Background flush period of sled itself; `None` disables it
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: Option<u64>,

    /// `true` selects `sled::Mode::HighThroughput`, `false` `LowSpace`
    #[serde(default = "default_high_throughput")]
    pub high_throughput: bool,

    /// Maximum number of writes staged in one transaction
    #[serde(default = "default_max_txn_entries")]
    pub max_txn_entries: usize,

    /// Maximum estimated size of one transaction in bytes
    #[serde(default = "default_max_txn_bytes")]
    pub max_txn_bytes: usize,

    /// Guard log writes against overwriting an index that is already stored;
    /// such writes fail with `StorageError::Conflict`. This is not isolation
    /// between concurrent transactions: sled batches stay last-writer-wins.
    #[serde(default)]
    pub detect_conflicts: bool,

    /// Update the prometheus counters in [`crate::metrics`]
    #[serde(default)]
    pub enable_metrics: bool,

    /// Emit per-transaction debug events from the engine adapter
    #[serde(default)]
    pub enable_logging: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            use_compression: default_use_compression(),
            compression_factor: default_compression_factor(),
            flush_every_ms: default_flush_every_ms(),
            high_throughput: default_high_throughput(),
            max_txn_entries: default_max_txn_entries(),
            max_txn_bytes: default_max_txn_bytes(),
            detect_conflicts: false,
            enable_metrics: false,
            enable_logging: false,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "cache_capacity must be greater than 0".into(),
            )));
        }

        if !(1..=22).contains(&self.compression_factor) {
            return Err(Error::Config(ConfigError::Message(format!(
                "compression_factor {} must be within 1..=22",
                self.compression_factor
            ))));
        }

        if self.flush_every_ms == Some(0) {
            return Err(Error::Config(ConfigError::Message(
                "flush_every_ms cannot be 0, use None to disable background flushes".into(),
            )));
        }

        if self.max_txn_entries == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_txn_entries must be greater than 0".into(),
            )));
        }

        if self.max_txn_bytes == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_txn_bytes must be greater than 0".into(),
            )));
        }

        Ok(())
    }
}

fn default_cache_capacity() -> u64 {
    1024 * 1024 * 1024 //1GB
}
fn default_use_compression() -> bool {
    true
}
fn default_compression_factor() -> i32 {
    1
}
fn default_flush_every_ms() -> Option<u64> {
    Some(10)
}
fn default_high_throughput() -> bool {
    true
}
fn default_max_txn_entries() -> usize {
    100_000
}
fn default_max_txn_bytes() -> usize {
    10 * 1024 * 1024 //10MB
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaintenanceConfig {
    /// Period of the space reclamation task
    #[serde(default = "default_reclaim_interval")]
    pub reclaim_interval_in_ms: u64,

    /// Share of the on-disk footprint that may remain after a productive
    /// reclamation pass. Must lie in (0, 1).
    #[serde(default = "default_reclaim_ratio")]
    pub reclaim_ratio: f64,

    /// Upper bound of back-to-back reclamation passes per tick
    #[serde(default = "default_max_reclaim_passes")]
    pub max_reclaim_passes: usize,

    /// Period of the forced durability sync
    #[serde(default = "default_sync_interval")]
    pub sync_interval_in_ms: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            reclaim_interval_in_ms: default_reclaim_interval(),
            reclaim_ratio: default_reclaim_ratio(),
            max_reclaim_passes: default_max_reclaim_passes(),
            sync_interval_in_ms: default_sync_interval(),
        }
    }
}

impl MaintenanceConfig {
    fn validate(&self) -> Result<()> {
        if self.reclaim_interval_in_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "reclaim_interval_in_ms cannot be 0".into(),
            )));
        }

        if self.sync_interval_in_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "sync_interval_in_ms cannot be 0".into(),
            )));
        }

        if !(self.reclaim_ratio > 0.0 && self.reclaim_ratio < 1.0) {
            return Err(Error::Config(ConfigError::Message(format!(
                "reclaim_ratio {} must be within (0, 1)",
                self.reclaim_ratio
            ))));
        }

        if self.max_reclaim_passes == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_reclaim_passes must be > 0".into(),
            )));
        }

        Ok(())
    }

    pub fn reclaim_interval(&self) -> Duration {
        Duration::from_millis(self.reclaim_interval_in_ms)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_in_ms)
    }
}

// 2 hours
fn default_reclaim_interval() -> u64 {
    2 * 60 * 60 * 1000
}
fn default_reclaim_ratio() -> f64 {
    0.7
}
fn default_max_reclaim_passes() -> usize {
    16
}
// 30 minutes
fn default_sync_interval() -> u64 {
    30 * 60 * 1000
}
