//! Configuration management for groupwise
//!
//! Settings come from three layers, later layers winning:
//! - built-in defaults
//! - a YAML or TOML configuration file
//! - `GROUPWISE_*` environment variables
//!
//! A process-wide configuration is kept behind [`global_config`]; every
//! grouping request captures a snapshot of it when it is created.

use std::path::Path;
use std::sync::RwLock;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

pub mod loader;
pub mod validation;

/// Main configuration structure for groupwise
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupwiseConfig {
    /// Parallel execution thresholds
    pub parallel: ParallelConfig,
    /// Defaults applied to grouping requests
    pub defaults: DefaultsConfig,
    /// Logging behaviour
    pub logging: LoggingConfig,
}

/// When key partitioning and aggregation fan out over the rayon pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Master switch for parallel execution
    pub enabled: bool,
    /// Minimum table height before key partitioning runs in parallel
    pub min_rows: usize,
    /// Minimum group count before aggregation runs in parallel
    pub min_groups: usize,
    /// Number of hash partitions; 0 uses the rayon pool size
    pub partitions: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_rows: 100_000,
            min_groups: 1_000,
            partitions: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// `maintain_order` used by `group_by` when the caller does not say
    pub maintain_order: bool,
    /// Keep dynamic windows that contain no rows
    pub include_empty_windows: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            maintain_order: false,
            include_empty_windows: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level this crate emits (error, warn, info, debug, trace, off)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// The configured level as a `log` filter
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.level.parse().map_err(|_| {
            Error::ConfigurationError(format!("Invalid log level: {}", self.level))
        })
    }

    /// Whether records at `level` pass this configuration.
    /// An unparseable level behaves like the default `info`.
    pub fn enabled(&self, level: log::Level) -> bool {
        level <= self.level_filter().unwrap_or(log::LevelFilter::Info)
    }
}

impl GroupwiseConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        loader::load_from_env()
    }

    /// Load configuration from a file (YAML or TOML)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        loader::load_from_file(path.as_ref())
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        loader::load_from_yaml(yaml)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml: &str) -> Result<Self> {
        loader::load_from_toml(toml)
    }

    /// Load configuration with precedence: defaults -> file -> env
    pub fn load_with_precedence<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self> {
        loader::load_with_precedence(config_file)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            Error::ConfigurationError(format!("Failed to serialize config to YAML: {}", e))
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| {
            Error::ConfigurationError(format!("Failed to serialize config to TOML: {}", e))
        })
    }

    /// Whether `rows` rows are enough to partition keys in parallel
    pub(crate) fn parallel_rows(&self, rows: usize) -> bool {
        self.parallel.enabled && rows >= self.parallel.min_rows
    }

    /// Whether `groups` groups are enough to aggregate in parallel
    pub(crate) fn parallel_groups(&self, groups: usize) -> bool {
        self.parallel.enabled && groups >= self.parallel.min_groups
    }

    pub(crate) fn partition_count(&self) -> usize {
        match self.parallel.partitions {
            0 => rayon::current_num_threads().max(1),
            n => n,
        }
    }
}

lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<GroupwiseConfig> = RwLock::new(GroupwiseConfig::default());
}

/// Snapshot of the process-wide configuration
pub fn global_config() -> GroupwiseConfig {
    match GLOBAL_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => {
            log::warn!("global configuration lock poisoned, using last written value");
            poisoned.into_inner().clone()
        }
    }
}

/// Replace the process-wide configuration after validating it
pub fn set_global_config(config: GroupwiseConfig) -> Result<()> {
    config.validate()?;
    let mut guard = GLOBAL_CONFIG
        .write()
        .map_err(|_| Error::ConfigurationError("global configuration lock poisoned".into()))?;
    *guard = config;
    Ok(())
}
