//! Cache provider facade.
//!
//! An execution context stashes auxiliary per-context data (localized message
//! lookups, tarpit hit counters) in named caches. The core treats every cache
//! as an opaque key/value store; eviction, expiry and distribution are up to
//! the provider.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{CoreError, CoreResult};

/// A named key/value cache.
#[derive(Debug)]
pub struct Cache {
    name: String,
    entries: RwLock<HashMap<String, Value>>,
}

impl Cache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The cache name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Put a value, returning the previous one.
    pub fn put(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value)
    }

    /// Remove a value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Whether the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Provider of named caches.
pub trait CacheFacade: Send + Sync {
    /// Look up a cache by name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CacheNotFound`] if no cache with that name is
    /// configured.
    fn get_cache(&self, name: &str) -> CoreResult<Arc<Cache>>;

    /// Names of all configured caches.
    fn cache_names(&self) -> Vec<String>;

    /// Whether a cache with that name is configured.
    fn has_cache(&self, name: &str) -> bool {
        self.get_cache(name).is_ok()
    }
}

/// In-process cache facade with a fixed set of cache names.
#[derive(Debug, Default)]
pub struct MemoryCacheFacade {
    caches: HashMap<String, Arc<Cache>>,
}

impl MemoryCacheFacade {
    /// Create a facade with the given cache names.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let caches = names
            .into_iter()
            .map(Into::into)
            .map(|name: String| (name.clone(), Arc::new(Cache::new(name))))
            .collect();
        Self { caches }
    }

    /// Add one more cache.
    #[must_use]
    pub fn with_cache(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.caches
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Cache::new(name)));
        self
    }
}

impl CacheFacade for MemoryCacheFacade {
    fn get_cache(&self, name: &str) -> CoreResult<Arc<Cache>> {
        self.caches
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::CacheNotFound {
                name: name.to_string(),
            })
    }

    fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.keys().cloned().collect();
        names.sort();
        names
    }
}
