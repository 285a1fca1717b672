#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for Keystone.
//!
//! # Usage
//!
//! ```rust,no_run
//! use keystone_config::Config;
//!
//! let loaded = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("log level: {}", loaded.config.logging.level);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`KEYSTONE_*`)
//! 2. **Workspace** (`{workspace}/.keystone/config.toml`)
//! 3. **User** (`~/.keystone/config.toml`)
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate does not depend on any other keystone crate; the execution
//! context factory converts sections to runtime settings.

/// `KEYSTONE_*` environment overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Deep merge of TOML layers.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::LoadedConfig;
pub use merge::ConfigLayer;
pub use types::*;

impl Config {
    /// Load configuration from every layer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer is malformed or the result
    /// fails validation.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<LoadedConfig> {
        loader::load(workspace_root, None)
    }

    /// Load configuration with an explicit home directory.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_with_home(
        workspace_root: Option<&std::path::Path>,
        home_dir: &std::path::Path,
    ) -> ConfigResult<LoadedConfig> {
        loader::load(workspace_root, Some(home_dir))
    }

    /// Load a single file over the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
