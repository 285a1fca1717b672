//! Mock collaborators for testing.

use std::sync::{Arc, Mutex, PoisonError};

use keystone_core::{MessageFacade, MessageFacadeFactory, UserFacade};

/// User facade whose identity can change mid-test.
#[derive(Debug, Clone, Default)]
pub struct MockUserFacade {
    user_id: Arc<Mutex<Option<String>>>,
    visitor_id: Arc<Mutex<Option<String>>>,
}

impl MockUserFacade {
    /// An anonymous user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log in as `user_id`.
    #[must_use]
    pub fn with_user(self, user_id: impl Into<String>) -> Self {
        self.set_user(Some(user_id.into()));
        self
    }

    /// Attach a visitor ID.
    #[must_use]
    pub fn with_visitor(self, visitor_id: impl Into<String>) -> Self {
        *self
            .visitor_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(visitor_id.into());
        self
    }

    /// Change the logged-in user.
    pub fn set_user(&self, user_id: Option<String>) {
        *self.user_id.lock().unwrap_or_else(PoisonError::into_inner) = user_id;
    }
}

impl UserFacade for MockUserFacade {
    fn user_id(&self) -> Option<String> {
        self.user_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn visitor_id(&self) -> Option<String> {
        self.visitor_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Message facade that records everything, shared by all its clones.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessageFacade {
    messages: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl RecordingMessageFacade {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory handing this same recorder to every context.
    #[must_use]
    pub fn factory(&self) -> MessageFacadeFactory {
        let shared = self.clone();
        Arc::new(move || Arc::new(shared.clone()) as Arc<dyn MessageFacade>)
    }

    /// Whether any recorded error contains `needle`.
    #[must_use]
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.errors().iter().any(|e| e.contains(needle))
    }
}

impl MessageFacade for RecordingMessageFacade {
    fn add_message(&self, message: String) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    fn add_error(&self, error: String) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear_errors(&self) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
