//! Prelude module - commonly used types for convenient import.
//!
//! Use `use keystone_tools::prelude::*;` to import all essential types.

pub use crate::{ToolError, ToolResult};

pub use crate::{ReleaseReport, ToolFactory, ToolFactoryRegistry, ToolInstance, ToolPolicy, ToolRegistry};
