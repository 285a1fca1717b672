//! Config file discovery and layered loading.
//!
//! 1. Parse embedded `defaults.toml`
//! 2. Merge `~/.keystone/config.toml` (user)
//! 3. Merge `{workspace}/.keystone/config.toml` (workspace)
//! 4. Apply `KEYSTONE_*` overrides
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, deep_merge};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration and the files that contributed to it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The final configuration.
    pub config: Config,
    /// Files merged on top of the defaults, with their layer, in merge order.
    pub loaded_files: Vec<(ConfigLayer, PathBuf)>,
    /// Number of environment overrides applied.
    pub env_overrides: usize,
}

/// Load configuration from every layer.
///
/// `home_override` replaces the home directory used to find
/// `.keystone/config.toml`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is unreadable or malformed, an
/// environment override has the wrong type, or validation fails.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<LoadedConfig> {
    let home_dir = match home_override {
        Some(h) => h.to_path_buf(),
        None => home_directory()?,
    };
    load_with_env(workspace_root, &home_dir, &collect_env_vars())
}

/// [`load`] with an explicit home directory and environment.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env(
    workspace_root: Option<&Path>,
    home_dir: &Path,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<LoadedConfig> {
    let mut merged = parse_defaults()?;
    let mut loaded_files = Vec::new();

    let user_path = home_dir.join(".keystone").join("config.toml");
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge(&mut merged, &overlay);
        info!(path = %user_path.display(), "loaded user config");
        loaded_files.push((ConfigLayer::User, user_path));
    }

    if let Some(root) = workspace_root {
        let ws_path = root.join(".keystone").join("config.toml");
        if let Some(overlay) = try_load_file(&ws_path)? {
            deep_merge(&mut merged, &overlay);
            info!(path = %ws_path.display(), "loaded workspace config");
            loaded_files.push((ConfigLayer::Workspace, ws_path));
        }
    }

    let env_overrides = apply_env_overrides(&mut merged, env_vars)?;
    if env_overrides > 0 {
        debug!(count = env_overrides, "applied environment overrides");
    }

    let config: Config = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source: e,
        })?;
    validate::validate(&config)?;

    Ok(LoadedConfig {
        config,
        loaded_files,
        env_overrides,
    })
}

/// Load a single file on top of the defaults (no other layers).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, unreadable, malformed or
/// invalid.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    let mut merged = parse_defaults()?;
    deep_merge(&mut merged, &overlay);

    let config: Config = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

fn parse_defaults() -> ConfigResult<toml::Value> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
        path: "<embedded defaults>".to_owned(),
        source: e,
    })
}

/// Read and parse a file, `None` if it does not exist.
///
/// Reads once and checks the size afterwards, so there is no window between
/// a metadata check and the read.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {size} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit"
            ),
        });
    }

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}
