//! Configuration loading utilities
//!
//! This module handles loading configuration from files and the environment
//! with proper precedence and validation.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use super::GroupwiseConfig;
use crate::core::error::{Error, Result};

/// Parse one environment variable if it is set
fn env_value<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::ConfigurationError(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

/// Apply `GROUPWISE_*` environment overrides to an existing configuration
pub fn apply_env_overrides(config: &mut GroupwiseConfig) -> Result<()> {
    if let Some(enabled) = env_value("GROUPWISE_PARALLEL_ENABLED")? {
        config.parallel.enabled = enabled;
    }
    if let Some(rows) = env_value("GROUPWISE_PARALLEL_MIN_ROWS")? {
        config.parallel.min_rows = rows;
    }
    if let Some(groups) = env_value("GROUPWISE_PARALLEL_MIN_GROUPS")? {
        config.parallel.min_groups = groups;
    }
    if let Some(partitions) = env_value("GROUPWISE_PARTITIONS")? {
        config.parallel.partitions = partitions;
    }
    if let Some(maintain_order) = env_value("GROUPWISE_MAINTAIN_ORDER")? {
        config.defaults.maintain_order = maintain_order;
    }
    if let Some(include) = env_value("GROUPWISE_INCLUDE_EMPTY_WINDOWS")? {
        config.defaults.include_empty_windows = include;
    }
    if let Ok(level) = env::var("GROUPWISE_LOG_LEVEL") {
        config.logging.level = level;
    }
    Ok(())
}

/// Load configuration from environment variables
pub fn load_from_env() -> Result<GroupwiseConfig> {
    let mut config = GroupwiseConfig::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a file, picking the format from its extension
pub fn load_from_file(path: &Path) -> Result<GroupwiseConfig> {
    if !path.exists() {
        return Err(Error::ConfigurationError(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path)?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => load_from_yaml(&contents),
        Some("toml") => load_from_toml(&contents),
        Some(ext) => Err(Error::ConfigurationError(format!(
            "Unsupported config file format: {}",
            ext
        ))),
        None => {
            log::warn!(
                "config file {} has no extension, trying YAML then TOML",
                path.display()
            );
            load_from_yaml(&contents).or_else(|_| load_from_toml(&contents))
        }
    }
}

pub fn load_from_yaml(yaml: &str) -> Result<GroupwiseConfig> {
    Ok(serde_yaml::from_str(yaml)?)
}

pub fn load_from_toml(source: &str) -> Result<GroupwiseConfig> {
    Ok(toml::from_str(source)?)
}

/// Load configuration: defaults, then the optional file, then the environment
pub fn load_with_precedence<P: AsRef<Path>>(config_file: Option<P>) -> Result<GroupwiseConfig> {
    let mut config = match config_file {
        Some(path) => load_from_file(path.as_ref())?,
        None => GroupwiseConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;

    log::debug!("loaded configuration: {:?}", config);
    Ok(config)
}

/// Write a configuration file in the format given by its extension
pub fn save_to_file(config: &GroupwiseConfig, path: &Path) -> Result<()> {
    let contents = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => config.to_toml()?,
        _ => config.to_yaml()?,
    };
    fs::write(path, contents)?;
    Ok(())
}
