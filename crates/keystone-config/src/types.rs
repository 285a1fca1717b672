//! Configuration types.
//!
//! Self-contained: no dependency on the other keystone crates. Conversion to
//! runtime types happens where the values are used. Every section implements
//! [`Default`] matching `defaults.toml`, so a bare `[section]` header works.

use serde::{Deserialize, Serialize};

/// Name of the localized message cache.
pub const L10N_MESSAGE_CACHE: &str = "l10n.message";

/// Name of the artifact tarpit hit cache.
pub const TARPIT_HIT_CACHE: &str = "artifact.tarpit.hits";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Execution context behavior.
    pub context: ContextSection,
    /// Tool resolution.
    pub tools: ToolsSection,
    /// In-process caches.
    pub cache: CacheSection,
    /// Artifact trail retention.
    pub trail: TrailSection,
    /// Logging level, format and directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ContextSection
// ---------------------------------------------------------------------------

/// Execution context behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSection {
    /// Skip recording artifact hit statistics.
    pub skip_stats: bool,
}

// ---------------------------------------------------------------------------
// ToolsSection
// ---------------------------------------------------------------------------

/// Tool resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// Reject singleton lookups with arguments that differ from the first
    /// lookup instead of logging a warning.
    pub strict_singleton_args: bool,
}

// ---------------------------------------------------------------------------
// CacheSection
// ---------------------------------------------------------------------------

/// In-process caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Cache names to create.
    pub names: Vec<String>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            names: vec![L10N_MESSAGE_CACHE.to_owned(), TARPIT_HIT_CACHE.to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// TrailSection
// ---------------------------------------------------------------------------

/// Artifact trail retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailSection {
    /// Completed root trees kept per context. `0` keeps all of them.
    pub max_retained_roots: usize,
}

impl Default for TrailSection {
    fn default() -> Self {
        Self {
            max_retained_roots: 100,
        }
    }
}

impl TrailSection {
    /// The retention bound, `None` when unbounded.
    #[must_use]
    pub fn retention(&self) -> Option<usize> {
        (self.max_retained_roots > 0).then_some(self.max_retained_roots)
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level filter (`"trace"` ... `"error"`).
    pub level: String,
    /// `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate directives, e.g. `["keystone_tools=debug"]`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
