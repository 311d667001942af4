//! Configuration validation utilities

use super::{GroupwiseConfig, LoggingConfig, ParallelConfig};
use crate::core::error::{Error, Result};

/// Validate the entire configuration
pub fn validate_config(config: &GroupwiseConfig) -> Result<()> {
    validate_parallel_config(&config.parallel)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

pub fn validate_parallel_config(config: &ParallelConfig) -> Result<()> {
    if config.min_rows == 0 {
        return Err(Error::ConfigurationError(
            "parallel.min_rows must be greater than 0".to_string(),
        ));
    }

    if config.min_groups == 0 {
        return Err(Error::ConfigurationError(
            "parallel.min_groups must be greater than 0".to_string(),
        ));
    }

    if config.partitions > 4096 {
        return Err(Error::ConfigurationError(format!(
            "parallel.partitions must be at most 4096, got {}",
            config.partitions
        )));
    }

    Ok(())
}

pub fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
    if !LEVELS.contains(&config.level.to_lowercase().as_str()) {
        return Err(Error::ConfigurationError(format!(
            "Invalid log level '{}', expected one of: {}",
            config.level,
            LEVELS.join(", ")
        )));
    }
    Ok(())
}
