//! Post-merge configuration validation.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound on retained artifact trees per context.
const MAX_RETAINED_ROOTS_UPPER_BOUND: usize = 1_000_000;

/// Validate a merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first [`ConfigError::ValidationError`] found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_cache(config)?;
    validate_trail(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_cache(config: &Config) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for name in &config.cache.names {
        if name.trim().is_empty() {
            return Err(invalid("cache.names", "cache names must not be empty"));
        }
        if !seen.insert(name.as_str()) {
            return Err(invalid(
                "cache.names",
                format!("duplicate cache name '{name}'"),
            ));
        }
    }
    Ok(())
}

fn validate_trail(config: &Config) -> ConfigResult<()> {
    if config.trail.max_retained_roots > MAX_RETAINED_ROOTS_UPPER_BOUND {
        return Err(invalid(
            "trail.max_retained_roots",
            format!("must be at most {MAX_RETAINED_ROOTS_UPPER_BOUND}"),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let logging = &config.logging;
    if logging.level.trim().is_empty() {
        return Err(invalid("logging.level", "log level must not be empty"));
    }
    if !matches!(
        logging.format.as_str(),
        "pretty" | "compact" | "json" | "full"
    ) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: pretty, compact, json, full",
                logging.format
            ),
        ));
    }
    if let Some(bad) = logging.directives.iter().find(|d| d.trim().is_empty()) {
        return Err(invalid(
            "logging.directives",
            format!("empty directive '{bad}'"),
        ));
    }
    Ok(())
}
