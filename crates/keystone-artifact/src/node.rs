//! Artifact execution nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ArtifactType, AuthorizationRecord, AuthzAction, AuthzOutcome};

/// Index of a node in its trail's arena.
///
/// Only meaningful for the trail that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One invocation of an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactExecutionNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) artifact_type: ArtifactType,
    pub(crate) action: Option<AuthzAction>,
    pub(crate) authorization: Option<AuthorizationRecord>,
    pub(crate) authorization_inheritable: bool,
    pub(crate) start_nanos: u64,
    pub(crate) total_running_time_nanos: Option<u64>,
    pub(crate) children_running_time_nanos: Option<u64>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl ArtifactExecutionNode {
    pub(crate) fn new(
        id: NodeId,
        name: String,
        artifact_type: ArtifactType,
        action: Option<AuthzAction>,
        parent: Option<NodeId>,
        start_nanos: u64,
    ) -> Self {
        Self {
            id,
            name,
            artifact_type,
            action,
            authorization: None,
            authorization_inheritable: false,
            start_nanos,
            total_running_time_nanos: None,
            children_running_time_nanos: None,
            parent,
            children: Vec::new(),
        }
    }

    /// This node's ID.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Artifact name, e.g. a service name or screen location.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Artifact type.
    #[must_use]
    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    /// Action being performed.
    #[must_use]
    pub fn action(&self) -> Option<AuthzAction> {
        self.action
    }

    /// Authorization recorded on this invocation.
    #[must_use]
    pub fn authorization(&self) -> Option<&AuthorizationRecord> {
        self.authorization.as_ref()
    }

    /// Whether an authorization check happened for this invocation.
    #[must_use]
    pub fn authorization_was_required(&self) -> bool {
        self.authorization.is_some()
    }

    /// Whether the recorded check granted access.
    #[must_use]
    pub fn authorization_was_granted(&self) -> Option<bool> {
        self.authorization
            .as_ref()
            .map(|r| r.outcome == AuthzOutcome::Granted)
    }

    /// Whether descendants may inherit this node's authorization.
    #[must_use]
    pub fn authorization_inheritable(&self) -> bool {
        self.authorization_inheritable
    }

    /// Clock reading when the invocation started.
    #[must_use]
    pub fn start_nanos(&self) -> u64 {
        self.start_nanos
    }

    /// Wall time of the invocation, set on pop.
    #[must_use]
    pub fn total_running_time_nanos(&self) -> Option<u64> {
        self.total_running_time_nanos
    }

    /// Summed wall time of the direct children, set by child-time calculation.
    #[must_use]
    pub fn children_running_time_nanos(&self) -> Option<u64> {
        self.children_running_time_nanos
    }

    /// Whether the invocation has been popped.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.total_running_time_nanos.is_some()
    }

    /// The invoking node.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Invocations made by this one, in start order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl fmt::Display for ArtifactExecutionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.artifact_type.description(), self.name)?;
        if let Some(action) = self.action {
            write!(f, " ({action})")?;
        }
        Ok(())
    }
}
