//! Per-context diagnostic fields.
//!
//! Each execution context carries its own correlation fields instead of
//! relying on thread-ambient state. The fields are rendered onto a
//! `tracing` span that the context's unit of work runs inside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::field;
use uuid::Uuid;

/// Field name for the authenticated user.
pub const USER_ID_FIELD: &str = "user_id";

/// Field name for the anonymous visitor.
pub const VISITOR_ID_FIELD: &str = "visitor_id";

/// Correlation fields of one execution context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticContext {
    /// Owning context.
    pub context_id: Uuid,
    /// Logical thread the context was created for.
    pub thread: String,
    /// When the context was created.
    pub started_at: DateTime<Utc>,
    fields: BTreeMap<String, String>,
}

impl DiagnosticContext {
    /// Create an empty diagnostic context.
    #[must_use]
    pub fn new(context_id: Uuid, thread: impl Into<String>) -> Self {
        Self {
            context_id,
            thread: thread.into(),
            started_at: Utc::now(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field, returning the previous value.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(key.into(), value.into())
    }

    /// Get a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    /// Remove every field.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields, sorted by key.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Set the [`USER_ID_FIELD`].
    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.put(USER_ID_FIELD, user_id);
    }

    /// The [`USER_ID_FIELD`].
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID_FIELD)
    }

    /// Set the [`VISITOR_ID_FIELD`].
    pub fn set_visitor_id(&mut self, visitor_id: impl Into<String>) {
        self.put(VISITOR_ID_FIELD, visitor_id);
    }

    /// The [`VISITOR_ID_FIELD`].
    #[must_use]
    pub fn visitor_id(&self) -> Option<&str> {
        self.get(VISITOR_ID_FIELD)
    }

    /// Milliseconds since the context was created.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// Span carrying the context ID, thread, user and visitor.
    ///
    /// Other fields are rendered as one `fields` value.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        let span = tracing::info_span!(
            "execution_context",
            context_id = %self.context_id,
            thread = %self.thread,
            user_id = field::Empty,
            visitor_id = field::Empty,
            fields = field::Empty,
        );
        if let Some(user_id) = self.user_id() {
            span.record(USER_ID_FIELD, user_id);
        }
        if let Some(visitor_id) = self.visitor_id() {
            span.record(VISITOR_ID_FIELD, visitor_id);
        }

        let extra: Vec<String> = self
            .fields
            .iter()
            .filter(|(k, _)| k.as_str() != USER_ID_FIELD && k.as_str() != VISITOR_ID_FIELD)
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if !extra.is_empty() {
            span.record("fields", extra.join(",").as_str());
        }
        span
    }

    /// First eight characters of the context ID.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.context_id.simple().to_string().chars().take(8).collect()
    }
}
