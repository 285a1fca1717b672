//! `KEYSTONE_*` environment overrides.
//!
//! Environment variables override every file layer. Values are coerced to
//! the type of the field they map to.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::set_path;

#[derive(Clone, Copy)]
enum Kind {
    Bool,
    Integer,
    String,
    StringList,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: Kind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "KEYSTONE_SKIP_STATS",
        field_path: "context.skip_stats",
        kind: Kind::Bool,
    },
    EnvMapping {
        var_name: "KEYSTONE_STRICT_SINGLETON_ARGS",
        field_path: "tools.strict_singleton_args",
        kind: Kind::Bool,
    },
    EnvMapping {
        var_name: "KEYSTONE_CACHE_NAMES",
        field_path: "cache.names",
        kind: Kind::StringList,
    },
    EnvMapping {
        var_name: "KEYSTONE_TRAIL_MAX_RETAINED_ROOTS",
        field_path: "trail.max_retained_roots",
        kind: Kind::Integer,
    },
    EnvMapping {
        var_name: "KEYSTONE_LOG_LEVEL",
        field_path: "logging.level",
        kind: Kind::String,
    },
    EnvMapping {
        var_name: "KEYSTONE_LOG_FORMAT",
        field_path: "logging.format",
        kind: Kind::String,
    },
];

/// Snapshot of the process's `KEYSTONE_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("KEYSTONE_"))
        .collect()
}

/// Apply every mapped variable present in `env_vars` to `merged`.
///
/// Returns how many were applied.
///
/// # Errors
///
/// [`ConfigError::EnvError`] if a value does not parse as its field's type.
pub fn apply_env_overrides<S: BuildHasher>(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;
    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };
        let value = coerce(mapping, raw)?;
        if !set_path(merged, mapping.field_path, value) {
            return Err(ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("cannot set {}", mapping.field_path),
            });
        }
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applied environment override"
        );
        count = count.saturating_add(1);
    }
    Ok(count)
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let err = |message: String| ConfigError::EnvError {
        var_name: mapping.var_name.to_owned(),
        message,
    };
    let raw = raw.trim();
    match mapping.kind {
        Kind::Bool => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Ok(toml::Value::Boolean(false)),
            _ => Err(err(format!("expected a boolean, got '{raw}'"))),
        },
        Kind::Integer => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|e| err(format!("expected an integer, got '{raw}': {e}"))),
        Kind::String => Ok(toml::Value::String(raw.to_owned())),
        Kind::StringList => Ok(toml::Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_owned()))
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_overrides_applied() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"info\"\n").unwrap();
        let count = apply_env_overrides(
            &mut merged,
            &env(&[
                ("KEYSTONE_LOG_LEVEL", "debug"),
                ("KEYSTONE_SKIP_STATS", "yes"),
                ("KEYSTONE_TRAIL_MAX_RETAINED_ROOTS", "7"),
                ("KEYSTONE_CACHE_NAMES", "a, b,,c"),
                ("UNRELATED", "x"),
            ]),
        )
        .unwrap();

        assert_eq!(count, 4);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["context"]["skip_stats"].as_bool(), Some(true));
        assert_eq!(merged["trail"]["max_retained_roots"].as_integer(), Some(7));
        assert_eq!(merged["cache"]["names"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_bad_bool_rejected() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let err = apply_env_overrides(&mut merged, &env(&[("KEYSTONE_STRICT_SINGLETON_ARGS", "maybe")]))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::EnvError { ref var_name, .. } if var_name == "KEYSTONE_STRICT_SINGLETON_ARGS")
        );
    }

    #[test]
    fn test_bad_integer_rejected() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let result = apply_env_overrides(
            &mut merged,
            &env(&[("KEYSTONE_TRAIL_MAX_RETAINED_ROOTS", "lots")]),
        );
        assert!(matches!(result, Err(ConfigError::EnvError { .. })));
    }
}
