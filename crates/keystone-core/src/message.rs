//! User-facing message accessor.
//!
//! The core only writes here: authorization denials and tool shutdown
//! failures. Rendering the messages is the consuming layer's job.

use std::sync::{Arc, Mutex, PoisonError};

/// Sink for user-facing messages and errors of one unit of work.
pub trait MessageFacade: Send + Sync {
    /// Add an informational message.
    fn add_message(&self, message: String);

    /// Add an error message.
    fn add_error(&self, error: String);

    /// All informational messages so far.
    fn messages(&self) -> Vec<String>;

    /// All error messages so far.
    fn errors(&self) -> Vec<String>;

    /// Whether any error has been added.
    fn has_error(&self) -> bool {
        !self.errors().is_empty()
    }

    /// Drop all collected errors.
    fn clear_errors(&self);
}

/// Builds a fresh [`MessageFacade`] for each new execution context.
pub type MessageFacadeFactory = Arc<dyn Fn() -> Arc<dyn MessageFacade> + Send + Sync>;

/// In-memory message facade.
#[derive(Debug, Default)]
pub struct MemoryMessageFacade {
    messages: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl MemoryMessageFacade {
    /// Create an empty message facade.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`MessageFacadeFactory`] producing empty in-memory facades.
    #[must_use]
    pub fn factory() -> MessageFacadeFactory {
        Arc::new(|| Arc::new(Self::new()) as Arc<dyn MessageFacade>)
    }
}

impl MessageFacade for MemoryMessageFacade {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_errors() {
        let facade = MemoryMessageFacade::new();
        assert!(!facade.has_error());

        facade.add_message("saved".into());
        facade.add_error("not authorized".into());

        assert_eq!(facade.messages(), vec!["saved".to_string()]);
        assert_eq!(facade.errors(), vec!["not authorized".to_string()]);
        assert!(facade.has_error());

        facade.clear_errors();
        assert!(!facade.has_error());
        assert_eq!(facade.messages().len(), 1);
    }

    #[test]
    fn test_factory_builds_independent_facades() {
        let factory = MemoryMessageFacade::factory();
        let a = factory();
        let b = factory();
        a.add_error("boom".into());
        assert!(a.has_error());
        assert!(!b.has_error());
    }
}
