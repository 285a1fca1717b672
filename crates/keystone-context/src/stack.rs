//! Scoped variable namespace.

use serde_json::{Map, Value};

use crate::error::{ContextError, ContextResult};

/// A stack of variable frames.
///
/// Lookups walk from the innermost frame outwards. Writes go to the
/// innermost frame. The root frame lives as long as the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextStack {
    frames: Vec<Map<String, Value>>,
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStack {
    /// A stack with an empty root frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Map::new()],
        }
    }

    /// A stack whose root frame is `root`.
    #[must_use]
    pub fn from_root(root: Map<String, Value>) -> Self {
        Self { frames: vec![root] }
    }

    /// Open a new innermost frame.
    pub fn push(&mut self) {
        self.frames.push(Map::new());
    }

    /// Close the innermost frame and return its variables.
    ///
    /// # Errors
    ///
    /// [`ContextError::ScopeUnderflow`] if only the root frame is left.
    pub fn pop(&mut self) -> ContextResult<Map<String, Value>> {
        if self.frames.len() <= 1 {
            return Err(ContextError::ScopeUnderflow);
        }
        self.frames.pop().ok_or(ContextError::ScopeUnderflow)
    }

    /// Look a variable up, innermost frame first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Set a variable in the innermost frame, returning the value it shadowed
    /// there.
    pub fn put(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.top_mut().insert(name.into(), value)
    }

    /// Remove a variable from the innermost frame only.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.top_mut().remove(name)
    }

    /// Whether any frame defines `name`.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.contains_key(name))
    }

    /// Look a variable up in the root frame only.
    #[must_use]
    pub fn root_get(&self, name: &str) -> Option<&Value> {
        self.frames.first().and_then(|root| root.get(name))
    }

    /// Set a variable in the root frame.
    pub fn root_put(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.root_mut().insert(name.into(), value)
    }

    /// Number of frames, including the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// All visible variables flattened into one map, inner frames winning.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        let mut flat = Map::new();
        for frame in &self.frames {
            for (key, value) in frame {
                flat.insert(key.clone(), value.clone());
            }
        }
        flat
    }

    /// A new stack whose root frame is a snapshot of this one.
    #[must_use]
    pub fn to_child(&self) -> Self {
        Self::from_root(self.snapshot())
    }

    fn top_mut(&mut self) -> &mut Map<String, Value> {
        if self.frames.is_empty() {
            self.frames.push(Map::new());
        }
        let last = self.frames.len().saturating_sub(1);
        &mut self.frames[last]
    }

    fn root_mut(&mut self) -> &mut Map<String, Value> {
        if self.frames.is_empty() {
            self.frames.push(Map::new());
        }
        &mut self.frames[0]
    }
}
