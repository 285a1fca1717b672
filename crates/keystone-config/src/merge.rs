//! Deep merge of TOML layers.
//!
//! Merging works on raw [`toml::Value`] trees so a key missing from an upper
//! layer never resets the lower layer's value to its serde default.

use std::fmt;

/// Where a configuration layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Embedded `defaults.toml`.
    Defaults,
    /// `~/.keystone/config.toml`.
    User,
    /// `{workspace}/.keystone/config.toml`.
    Workspace,
    /// `KEYSTONE_*` variables.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user (~/.keystone/config.toml)"),
            Self::Workspace => write!(f, "workspace (.keystone/config.toml)"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Merge `overlay` into `base`.
///
/// Tables merge key by key. Scalars and arrays in `overlay` replace the base
/// value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                match base_table.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                    },
                }
            }
        },
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Set the value at a dotted path, creating intermediate tables.
///
/// Returns `false` if a non-table value sits on the path.
pub fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) -> bool {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return false;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return false;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    match current.as_table_mut() {
        Some(table) => {
            table.insert(leaf.to_owned(), value);
            true
        },
        None => false,
    }
}
