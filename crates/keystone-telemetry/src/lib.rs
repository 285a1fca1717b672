//! Keystone Telemetry - logging setup and per-context diagnostic fields.
//!
//! This crate provides:
//! - [`setup_logging`] to install a `tracing` subscriber from a [`LogConfig`]
//! - [`DiagnosticContext`], the correlation fields (user, visitor, ...) an
//!   execution context attaches to every log line it emits
//!
//! # Example
//!
//! ```rust,no_run
//! use keystone_telemetry::{DiagnosticContext, LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), keystone_telemetry::TelemetryError> {
//! let _guard = setup_logging(
//!     &LogConfig::new("info")
//!         .with_format(LogFormat::Compact)
//!         .with_directive("keystone_context=debug"),
//! )?;
//!
//! let mut diagnostics = DiagnosticContext::new(uuid::Uuid::new_v4(), "worker-1");
//! diagnostics.set_user_id("john.doe");
//!
//! let span = diagnostics.span();
//! let _entered = span.enter();
//! tracing::info!("Order placed");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod diagnostic;
mod error;
mod logging;

pub use diagnostic::{DiagnosticContext, USER_ID_FIELD, VISITOR_ID_FIELD};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, LoggingGuard, setup_logging,
};
