//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystone_telemetry::prelude::*;` to import all essential types.

pub use crate::{TelemetryError, TelemetryResult};

pub use crate::{LogConfig, LogFormat, LogTarget, LoggingGuard, setup_logging};

pub use crate::DiagnosticContext;
