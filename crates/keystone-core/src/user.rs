//! User/session accessor.
//!
//! The execution context only reads a user id and a visitor id from here, for
//! authorization records and log correlation. Authentication itself belongs
//! to whatever layer implements this trait.

/// Read-only view of the user behind a unit of work.
pub trait UserFacade: Send + Sync {
    /// ID of the authenticated user, if any.
    fn user_id(&self) -> Option<String>;

    /// ID of the visitor (anonymous browser/session identity), if any.
    fn visitor_id(&self) -> Option<String>;
}

/// A user facade with no user and no visitor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUser;

impl UserFacade for AnonymousUser {
    fn user_id(&self) -> Option<String> {
        None
    }

    fn visitor_id(&self) -> Option<String> {
        None
    }
}

/// A user facade with fixed values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticUser {
    user_id: Option<String>,
    visitor_id: Option<String>,
}

impl StaticUser {
    /// Create a facade for the given user ID.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            visitor_id: None,
        }
    }

    /// Set the visitor ID.
    #[must_use]
    pub fn with_visitor(mut self, visitor_id: impl Into<String>) -> Self {
        self.visitor_id = Some(visitor_id.into());
        self
    }
}

impl UserFacade for StaticUser {
    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn visitor_id(&self) -> Option<String> {
        self.visitor_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_user() {
        let user = AnonymousUser;
        assert!(user.user_id().is_none());
        assert!(user.visitor_id().is_none());
    }

    #[test]
    fn test_static_user() {
        let user = StaticUser::new("john.doe").with_visitor("v-100");
        assert_eq!(user.user_id().as_deref(), Some("john.doe"));
        assert_eq!(user.visitor_id().as_deref(), Some("v-100"));
    }
}
