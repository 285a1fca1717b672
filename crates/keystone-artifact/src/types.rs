//! Artifact and authorization vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ArtifactError;

/// Kind of artifact being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// A screen.
    Screen,
    /// A transition between screens.
    ScreenTransition,
    /// Static content served by a screen.
    ScreenContent,
    /// A service call.
    Service,
    /// An entity (data access) operation.
    Entity,
    /// A REST resource path.
    RestPath,
    /// Anything else.
    Other,
}

impl ArtifactType {
    /// All artifact types.
    pub const ALL: [Self; 7] = [
        Self::Screen,
        Self::ScreenTransition,
        Self::ScreenContent,
        Self::Service,
        Self::Entity,
        Self::RestPath,
        Self::Other,
    ];

    /// Stable code used in persisted artifact statistics.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Screen => "AT_XML_SCREEN",
            Self::ScreenTransition => "AT_XML_SCREEN_TRANS",
            Self::ScreenContent => "AT_XML_SCREEN_CONTENT",
            Self::Service => "AT_SERVICE",
            Self::Entity => "AT_ENTITY",
            Self::RestPath => "AT_REST_PATH",
            Self::Other => "AT_OTHER",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Screen => "Screen",
            Self::ScreenTransition => "Screen Transition",
            Self::ScreenContent => "Screen Content",
            Self::Service => "Service",
            Self::Entity => "Entity",
            Self::RestPath => "REST Path",
            Self::Other => "Other",
        }
    }

    /// Parse a type from its stable code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Action being authorized on an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzAction {
    /// Read.
    View,
    /// Create.
    Create,
    /// Update.
    Update,
    /// Delete.
    Delete,
    /// Any action.
    All,
}

impl AuthzAction {
    /// Stable code used in persisted authorization records.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::View => "AUTHZA_VIEW",
            Self::Create => "AUTHZA_CREATE",
            Self::Update => "AUTHZA_UPDATE",
            Self::Delete => "AUTHZA_DELETE",
            Self::All => "AUTHZA_ALL",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::View => "View",
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::All => "All",
        }
    }
}

impl FromStr for AuthzAction {
    type Err = ArtifactError;

    /// Parse a short action name as used by service verbs
    /// (`view`, `create`, `update`, `delete`, `all`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "all" => Ok(Self::All),
            _ => Err(ArtifactError::UnknownAction(s.to_string())),
        }
    }
}

impl fmt::Display for AuthzAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Kind of rule that produced an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzType {
    /// Allowed unless another rule denies.
    Allow,
    /// Denied.
    Deny,
    /// Always allowed, overriding denials.
    Always,
}

impl AuthzType {
    /// Stable code used in persisted authorization records.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Allow => "AUTHZT_ALLOW",
            Self::Deny => "AUTHZT_DENY",
            Self::Always => "AUTHZT_ALWAYS",
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthzOutcome {
    /// Access granted.
    Granted,
    /// Access denied.
    Denied,
}

impl AuthzOutcome {
    /// Whether access was granted.
    #[must_use]
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Authorization decision recorded on an artifact invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    /// Granted or denied.
    pub outcome: AuthzOutcome,
    /// User the decision was made for, if any.
    pub user_id: Option<String>,
    /// Rule kind that produced the decision.
    pub authz_type: AuthzType,
    /// Action that was authorized, if it differs from the invocation's.
    pub action: Option<AuthzAction>,
}

impl AuthorizationRecord {
    /// A granted decision.
    #[must_use]
    pub fn granted(authz_type: AuthzType) -> Self {
        Self {
            outcome: AuthzOutcome::Granted,
            user_id: None,
            authz_type,
            action: None,
        }
    }

    /// A denied decision.
    #[must_use]
    pub fn denied(authz_type: AuthzType) -> Self {
        Self {
            outcome: AuthzOutcome::Denied,
            user_id: None,
            authz_type,
            action: None,
        }
    }

    /// Set the user.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the action.
    #[must_use]
    pub fn with_action(mut self, action: AuthzAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Whether access was granted.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.outcome.is_granted()
    }
}
