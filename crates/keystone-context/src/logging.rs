//! Logging setup from the `[logging]` configuration section.

use keystone_config::{Config, LoggingSection};
use keystone_telemetry::{LogConfig, LogFormat, LoggingGuard, setup_logging};

use crate::error::ContextResult;

/// Convert the `[logging]` section to a [`LogConfig`].
///
/// # Errors
///
/// [`ContextError::Telemetry`](crate::ContextError::Telemetry) for an unknown
/// format.
pub fn log_config(section: &LoggingSection) -> ContextResult<LogConfig> {
    let format: LogFormat = section.format.parse()?;
    let mut config = LogConfig::new(section.level.clone()).with_format(format);
    for directive in &section.directives {
        config = config.with_directive(directive.clone());
    }
    Ok(config)
}

/// Install the global subscriber described by `config`.
///
/// Keep the returned guard alive for as long as logs should be written.
///
/// # Errors
///
/// [`ContextError::Telemetry`](crate::ContextError::Telemetry) if the
/// configuration is invalid or a subscriber is already installed.
pub fn init_logging(config: &Config) -> ContextResult<LoggingGuard> {
    Ok(setup_logging(&log_config(&config.logging)?)?)
}
