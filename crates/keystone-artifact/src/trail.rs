//! The artifact execution trail.

use std::sync::Arc;
use tracing::{debug, trace};

use crate::clock::{Clock, MonotonicClock};
use crate::error::{ArtifactError, ArtifactResult};
use crate::node::{ArtifactExecutionNode, NodeId};
use crate::types::{ArtifactType, AuthorizationRecord, AuthzAction, AuthzOutcome};

/// Stack of open artifact invocations plus the tree of completed ones.
///
/// Nodes are stored in push order. A root only starts once the previous root
/// has completed, so each root's subtree is a contiguous run of the arena and
/// evicting old roots is a prefix drain. [`NodeId`]s are never reused; IDs of
/// evicted nodes resolve to [`ArtifactError::UnknownNode`].
#[derive(Debug)]
pub struct ArtifactExecutionTrail {
    nodes: Vec<ArtifactExecutionNode>,
    /// ID of `nodes[0]`.
    offset: usize,
    stack: Vec<NodeId>,
    roots: Vec<NodeId>,
    clock: Arc<dyn Clock>,
    inherited: Option<AuthorizationRecord>,
    authz_disabled: bool,
    max_retained_roots: Option<usize>,
}

impl Default for ArtifactExecutionTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactExecutionTrail {
    /// Create an empty trail timed by a [`MonotonicClock`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()))
    }

    /// Create an empty trail timed by the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            nodes: Vec::new(),
            offset: 0,
            stack: Vec::new(),
            roots: Vec::new(),
            clock,
            inherited: None,
            authz_disabled: false,
            max_retained_roots: None,
        }
    }

    /// Bound the number of completed root trees kept for reporting.
    ///
    /// `None` keeps everything.
    #[must_use]
    pub fn with_max_retained_roots(mut self, max: Option<usize>) -> Self {
        self.max_retained_roots = max;
        self
    }

    /// Start a trail for a unit of work handed off from `parent`.
    ///
    /// Only the authorization decision that `parent`'s current invocation
    /// lets descendants inherit is carried over, together with the
    /// authorization-disabled flag and the clock. No nodes are copied.
    #[must_use]
    pub fn inherit_from(parent: &Self) -> Self {
        let mut trail = Self::with_clock(Arc::clone(&parent.clock))
            .with_max_retained_roots(parent.max_retained_roots);
        trail.inherited = parent.inheritable_authorization().cloned();
        trail.authz_disabled = parent.authz_disabled;
        trail
    }

    /// Current clock reading.
    #[must_use]
    pub fn now_nanos(&self) -> u64 {
        self.clock.now_nanos()
    }

    /// Start an artifact invocation as a child of the current one, or as a
    /// new root when nothing is running.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        artifact_type: ArtifactType,
        action: Option<AuthzAction>,
    ) -> NodeId {
        let parent = self.stack.last().copied();
        if parent.is_none() {
            self.evict_old_roots();
        }

        let id = NodeId(self.offset.saturating_add(self.nodes.len()));
        let start = self.clock.now_nanos();
        let node =
            ArtifactExecutionNode::new(id, name.into(), artifact_type, action, parent, start);
        trace!(node = %id, artifact = %node, depth = self.stack.len(), "Artifact pushed");

        match parent {
            Some(parent) => self.node_mut(parent).children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        self.stack.push(id);
        id
    }

    /// Record the authorization decision for the current invocation.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::EmptyTrail`] if nothing is running,
    /// [`ArtifactError::AlreadyAuthorized`] if the current invocation already
    /// has a decision.
    pub fn record_authorization(
        &mut self,
        record: AuthorizationRecord,
        inheritable: bool,
    ) -> ArtifactResult<()> {
        let top = self.top("record_authorization")?;
        let node = self.node_mut(top);
        if node.authorization.is_some() {
            return Err(ArtifactError::AlreadyAuthorized {
                name: node.name.clone(),
            });
        }
        debug!(
            artifact = %node,
            outcome = ?record.outcome,
            user_id = record.user_id.as_deref().unwrap_or(""),
            inheritable,
            "Authorization recorded"
        );
        node.authorization = Some(record);
        node.authorization_inheritable = inheritable;
        Ok(())
    }

    /// Change whether descendants of the current invocation inherit its
    /// authorization.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::EmptyTrail`] if nothing is running.
    pub fn set_authorization_inheritable(&mut self, inheritable: bool) -> ArtifactResult<()> {
        let top = self.top("set_authorization_inheritable")?;
        self.node_mut(top).authorization_inheritable = inheritable;
        Ok(())
    }

    /// Complete the current invocation.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::EmptyTrail`] if nothing is running.
    pub fn pop(&mut self) -> ArtifactResult<NodeId> {
        let top = self.stack.pop().ok_or(ArtifactError::EmptyTrail {
            operation: "pop",
        })?;
        let now = self.clock.now_nanos();
        let node = self.node_mut(top);
        let total = now.saturating_sub(node.start_nanos);
        node.total_running_time_nanos = Some(total);
        trace!(node = %top, artifact = %node, total_nanos = total, "Artifact popped");
        Ok(top)
    }

    /// Complete the current invocation, checking that it is `name`.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::EmptyTrail`] if nothing is running,
    /// [`ArtifactError::UnexpectedPop`] if a different artifact is on top. The
    /// trail is left unchanged on error.
    pub fn pop_expecting(&mut self, name: &str) -> ArtifactResult<NodeId> {
        let top = self.top("pop")?;
        let actual = &self.node_ref(top).name;
        if actual != name {
            return Err(ArtifactError::UnexpectedPop {
                expected: name.to_string(),
                actual: actual.clone(),
            });
        }
        self.pop()
    }

    /// The authorization decision governing the current invocation.
    ///
    /// The current invocation's own decision wins. Otherwise the nearest
    /// ancestor's decision applies as long as every ancestor walked through
    /// is inheritable; a non-inheritable ancestor ends the walk with no
    /// decision. Walking past the root falls back to the decision carried
    /// over by [`inherit_from`](Self::inherit_from).
    #[must_use]
    pub fn current_authorization(&self) -> Option<&AuthorizationRecord> {
        let Some(&top) = self.stack.last() else {
            return self.inherited.as_ref();
        };
        let top = self.node_ref(top);
        if let Some(record) = &top.authorization {
            return Some(record);
        }

        let mut cursor = top.parent;
        while let Some(id) = cursor {
            let node = self.node_ref(id);
            if !node.authorization_inheritable {
                return None;
            }
            if let Some(record) = &node.authorization {
                return Some(record);
            }
            cursor = node.parent;
        }
        self.inherited.as_ref()
    }

    /// Outcome of [`current_authorization`](Self::current_authorization).
    #[must_use]
    pub fn current_authorization_allowed(&self) -> Option<AuthzOutcome> {
        self.current_authorization().map(|r| r.outcome)
    }

    /// The decision a child started right now could inherit: like
    /// [`current_authorization`](Self::current_authorization) but the
    /// current invocation must be inheritable too.
    fn inheritable_authorization(&self) -> Option<&AuthorizationRecord> {
        let mut cursor = self.stack.last().copied();
        while let Some(id) = cursor {
            let node = self.node_ref(id);
            if !node.authorization_inheritable {
                return None;
            }
            if let Some(record) = &node.authorization {
                return Some(record);
            }
            cursor = node.parent;
        }
        self.inherited.as_ref()
    }

    /// Pin the inherited decision (if any) onto the current invocation and
    /// mark it inheritable, so deeper descendants keep it without another
    /// check.
    ///
    /// Returns the pinned outcome. An invocation that already has its own
    /// decision keeps it.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::EmptyTrail`] if nothing is running.
    pub fn inherit_authorization(&mut self) -> ArtifactResult<Option<AuthzOutcome>> {
        let top = self.top("inherit_authorization")?;
        if let Some(record) = &self.node_ref(top).authorization {
            return Ok(Some(record.outcome));
        }
        let Some(record) = self.current_authorization().cloned() else {
            return Ok(None);
        };
        let outcome = record.outcome;
        let node = self.node_mut(top);
        node.authorization = Some(record);
        node.authorization_inheritable = true;
        Ok(Some(outcome))
    }

    /// Skip authorization checks until [`enable_authz`](Self::enable_authz).
    ///
    /// Returns whether checks were already disabled, so callers can restore
    /// the previous state.
    pub fn disable_authz(&mut self) -> bool {
        std::mem::replace(&mut self.authz_disabled, true)
    }

    /// Re-enable authorization checks.
    pub fn enable_authz(&mut self) {
        self.authz_disabled = false;
    }

    /// Whether authorization checks are disabled.
    #[must_use]
    pub fn authz_disabled(&self) -> bool {
        self.authz_disabled
    }

    /// Own time of `id`, caching the children total on every node visited.
    ///
    /// With `recurse` the children's own times are computed as well.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::UnknownNode`] for a foreign or evicted ID,
    /// [`ArtifactError::NotCompleted`] if `id` or one of its children is
    /// still running.
    pub fn calc_child_time(&mut self, id: NodeId, recurse: bool) -> ArtifactResult<u64> {
        let node = self.node(id)?;
        let total = completed_total(node)?;
        let children = node.children.clone();

        let mut children_total = 0u64;
        for child in children {
            children_total = children_total.saturating_add(completed_total(self.node_ref(child))?);
            if recurse {
                self.calc_child_time(child, true)?;
            }
        }
        self.node_mut(id).children_running_time_nanos = Some(children_total);
        Ok(total.saturating_sub(children_total))
    }

    /// Own time of `id`: its total minus its direct children's totals.
    ///
    /// # Errors
    ///
    /// Same as [`calc_child_time`](Self::calc_child_time).
    pub fn own_time_nanos(&self, id: NodeId) -> ArtifactResult<u64> {
        let node = self.node(id)?;
        let total = completed_total(node)?;
        let mut children_total = 0u64;
        for &child in &node.children {
            children_total = children_total.saturating_add(completed_total(self.node_ref(child))?);
        }
        Ok(total.saturating_sub(children_total))
    }

    /// Share of the parent's total time spent in `id`, in percent.
    ///
    /// `None` for roots and for parents with zero total time.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::UnknownNode`] or [`ArtifactError::NotCompleted`].
    pub fn percent_of_parent_time(&self, id: NodeId) -> ArtifactResult<Option<f64>> {
        let node = self.node(id)?;
        let total = completed_total(node)?;
        let Some(parent) = node.parent else {
            return Ok(None);
        };
        let parent_total = completed_total(self.node_ref(parent))?;
        if parent_total == 0 {
            return Ok(None);
        }
        Ok(Some(percent(total, parent_total)))
    }

    /// Look up a node.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::UnknownNode`] for a foreign or evicted ID.
    pub fn node(&self, id: NodeId) -> ArtifactResult<&ArtifactExecutionNode> {
        id.0.checked_sub(self.offset)
            .and_then(|i| self.nodes.get(i))
            .ok_or(ArtifactError::UnknownNode(id.0))
    }

    /// The innermost running invocation.
    #[must_use]
    pub fn current(&self) -> Option<&ArtifactExecutionNode> {
        self.stack.last().map(|&id| self.node_ref(id))
    }

    /// Number of running invocations.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether nothing is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    /// Running invocations, outermost first.
    #[must_use]
    pub fn stack(&self) -> &[NodeId] {
        &self.stack
    }

    /// Roots of all retained trees, oldest first. The last one may still be
    /// running.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Roots of retained trees that have completed, oldest first.
    #[must_use]
    pub fn completed_roots(&self) -> Vec<NodeId> {
        self.roots
            .iter()
            .copied()
            .filter(|&id| self.node_ref(id).is_completed())
            .collect()
    }

    /// All retained nodes in push order.
    #[must_use]
    pub fn nodes(&self) -> &[ArtifactExecutionNode] {
        &self.nodes
    }

    fn top(&self, operation: &'static str) -> ArtifactResult<NodeId> {
        self.stack
            .last()
            .copied()
            .ok_or(ArtifactError::EmptyTrail { operation })
    }

    /// Access a node the trail itself handed out and still retains.
    pub(crate) fn node_ref(&self, id: NodeId) -> &ArtifactExecutionNode {
        &self.nodes[id.0.wrapping_sub(self.offset)]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut ArtifactExecutionNode {
        let index = id.0.wrapping_sub(self.offset);
        &mut self.nodes[index]
    }

    fn evict_old_roots(&mut self) {
        let Some(max) = self.max_retained_roots else {
            return;
        };
        // Room for the root about to be pushed.
        let keep = max.saturating_sub(1);
        let evict = self.roots.len().saturating_sub(keep);
        if evict == 0 {
            return;
        }

        let first_kept = self
            .roots
            .get(evict)
            .map_or(self.offset.saturating_add(self.nodes.len()), |id| id.0);
        let drained = first_kept.saturating_sub(self.offset);
        self.nodes.drain(..drained);
        self.roots.drain(..evict);
        self.offset = first_kept;
        debug!(roots = evict, nodes = drained, "Evicted completed artifact trees");
    }
}

pub(crate) fn completed_total(node: &ArtifactExecutionNode) -> ArtifactResult<u64> {
    node.total_running_time_nanos
        .ok_or_else(|| ArtifactError::NotCompleted {
            name: node.name.clone(),
        })
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: u64, whole: u64) -> f64 {
    (part as f64 / whole as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::AuthzType;
    use std::time::Duration;

    fn manual_trail() -> (ManualClock, ArtifactExecutionTrail) {
        let clock = ManualClock::new();
        let trail = ArtifactExecutionTrail::with_clock(Arc::new(clock.clone()));
        (clock, trail)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_push_links_parent_and_children() {
        let (_clock, mut trail) = manual_trail();
        let root = trail.push("screen/Order", ArtifactType::Screen, Some(AuthzAction::View));
        let child = trail.push("order.get#Order", ArtifactType::Service, Some(AuthzAction::View));

        assert_eq!(trail.depth(), 2);
        assert_eq!(trail.stack(), &[root, child]);
        assert_eq!(trail.node(child).unwrap().parent(), Some(root));
        assert_eq!(trail.node(root).unwrap().children(), &[child]);
        assert_eq!(trail.roots(), &[root]);
        assert_eq!(trail.current().unwrap().name(), "order.get#Order");
    }

    #[test]
    fn test_svc_a_calls_svc_b_timing() {
        let (clock, mut trail) = manual_trail();
        let a = trail.push("svcA", ArtifactType::Service, None);
        clock.advance(ms(5));
        let b = trail.push("svcB", ArtifactType::Service, None);
        clock.advance(ms(10));
        assert_eq!(trail.pop().unwrap(), b);
        clock.advance(ms(15));
        assert_eq!(trail.pop().unwrap(), a);

        assert_eq!(trail.node(a).unwrap().total_running_time_nanos(), Some(30_000_000));
        assert_eq!(trail.calc_child_time(a, true).unwrap(), 20_000_000);
        assert_eq!(trail.node(a).unwrap().children_running_time_nanos(), Some(10_000_000));
        assert_eq!(trail.own_time_nanos(b).unwrap(), 10_000_000);
        assert_eq!(trail.node(b).unwrap().children_running_time_nanos(), Some(0));

        let pct = trail.percent_of_parent_time(b).unwrap().unwrap();
        assert!((pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(trail.percent_of_parent_time(a).unwrap(), None);
        assert!(trail.is_idle());
        assert_eq!(trail.completed_roots(), vec![a]);
    }

    #[test]
    fn test_pop_on_empty_trail_fails() {
        let (_clock, mut trail) = manual_trail();
        trail.push("svc", ArtifactType::Service, None);
        trail.pop().unwrap();
        let err = trail.pop().unwrap_err();
        assert_eq!(err, ArtifactError::EmptyTrail { operation: "pop" });
    }

    #[test]
    fn test_pop_expecting_checks_name() {
        let (_clock, mut trail) = manual_trail();
        trail.push("outer", ArtifactType::Service, None);
        trail.push("inner", ArtifactType::Entity, None);

        let err = trail.pop_expecting("outer").unwrap_err();
        assert_eq!(
            err,
            ArtifactError::UnexpectedPop {
                expected: "outer".into(),
                actual: "inner".into()
            }
        );
        assert_eq!(trail.depth(), 2);
        trail.pop_expecting("inner").unwrap();
        trail.pop_expecting("outer").unwrap();
    }

    #[test]
    fn test_incomplete_node_has_no_timing() {
        let (_clock, mut trail) = manual_trail();
        let root = trail.push("running", ArtifactType::Screen, None);
        let err = trail.own_time_nanos(root).unwrap_err();
        assert_eq!(err, ArtifactError::NotCompleted { name: "running".into() });
        assert!(trail.completed_roots().is_empty());
    }

    #[test]
    fn test_record_authorization_twice_fails() {
        let (_clock, mut trail) = manual_trail();
        assert_eq!(
            trail
                .record_authorization(AuthorizationRecord::granted(AuthzType::Allow), false)
                .unwrap_err(),
            ArtifactError::EmptyTrail { operation: "record_authorization" }
        );

        trail.push("svc", ArtifactType::Service, Some(AuthzAction::Update));
        trail
            .record_authorization(AuthorizationRecord::granted(AuthzType::Allow), false)
            .unwrap();
        let err = trail
            .record_authorization(AuthorizationRecord::denied(AuthzType::Deny), false)
            .unwrap_err();
        assert_eq!(err, ArtifactError::AlreadyAuthorized { name: "svc".into() });
        assert_eq!(trail.current_authorization_allowed(), Some(AuthzOutcome::Granted));
    }

    #[test]
    fn test_authorization_inherited_through_inheritable_chain() {
        let (_clock, mut trail) = manual_trail();
        trail.push("screen", ArtifactType::Screen, Some(AuthzAction::View));
        trail
            .record_authorization(AuthorizationRecord::granted(AuthzType::Allow), true)
            .unwrap();
        trail.push("transition", ArtifactType::ScreenTransition, None);
        trail.set_authorization_inheritable(true).unwrap();
        trail.push("service", ArtifactType::Service, None);

        assert_eq!(trail.current_authorization_allowed(), Some(AuthzOutcome::Granted));
    }

    #[test]
    fn test_non_inheritable_link_breaks_chain() {
        let (_clock, mut trail) = manual_trail();
        trail.push("screen", ArtifactType::Screen, None);
        trail
            .record_authorization(AuthorizationRecord::granted(AuthzType::Allow), true)
            .unwrap();
        trail.push("transition", ArtifactType::ScreenTransition, None);
        trail.push("service", ArtifactType::Service, None);

        assert_eq!(trail.current_authorization_allowed(), None);
    }

    #[test]
    fn test_non_inheritable_record_not_inherited() {
        let (_clock, mut trail) = manual_trail();
        trail.push("screen", ArtifactType::Screen, None);
        trail
            .record_authorization(AuthorizationRecord::denied(AuthzType::Deny), false)
            .unwrap();
        assert_eq!(trail.current_authorization_allowed(), Some(AuthzOutcome::Denied));

        trail.push("service", ArtifactType::Service, None);
        assert_eq!(trail.current_authorization_allowed(), None);
    }

    #[test]
    fn test_inherit_from_carries_only_inheritable_decision() {
        let (_clock, mut parent) = manual_trail();
        parent.push("screen", ArtifactType::Screen, None);
        parent
            .record_authorization(
                AuthorizationRecord::granted(AuthzType::Always).with_user("john.doe"),
                true,
            )
            .unwrap();
        parent.disable_authz();

        let child = ArtifactExecutionTrail::inherit_from(&parent);
        assert!(child.is_idle());
        assert!(child.nodes().is_empty());
        assert!(child.authz_disabled());
        assert_eq!(child.current_authorization_allowed(), Some(AuthzOutcome::Granted));

        let (_clock, mut closed) = manual_trail();
        closed.push("screen", ArtifactType::Screen, None);
        closed
            .record_authorization(AuthorizationRecord::granted(AuthzType::Allow), false)
            .unwrap();
        let child = ArtifactExecutionTrail::inherit_from(&closed);
        assert_eq!(child.current_authorization_allowed(), None);
    }

    #[test]
    fn test_inherited_decision_reaches_through_roots() {
        let (_clock, mut parent) = manual_trail();
        parent.push("job", ArtifactType::Other, None);
        parent
            .record_authorization(AuthorizationRecord::denied(AuthzType::Deny), true)
            .unwrap();

        let mut child = ArtifactExecutionTrail::inherit_from(&parent);
        child.push("svc", ArtifactType::Service, None);
        child.set_authorization_inheritable(true).unwrap();
        child.push("entity", ArtifactType::Entity, None);
        assert_eq!(child.current_authorization_allowed(), Some(AuthzOutcome::Denied));

        assert_eq!(child.inherit_authorization().unwrap(), Some(AuthzOutcome::Denied));
        let current = child.current().unwrap();
        assert!(current.authorization_inheritable());
        assert_eq!(current.authorization_was_granted(), Some(false));
    }

    #[test]
    fn test_inherit_authorization_without_decision() {
        let (_clock, mut trail) = manual_trail();
        assert!(trail.inherit_authorization().is_err());
        trail.push("svc", ArtifactType::Service, None);
        assert_eq!(trail.inherit_authorization().unwrap(), None);
        assert!(!trail.current().unwrap().authorization_was_required());
    }

    #[test]
    fn test_disable_authz_returns_previous_state() {
        let mut trail = ArtifactExecutionTrail::new();
        assert!(!trail.disable_authz());
        assert!(trail.disable_authz());
        assert!(trail.authz_disabled());
        trail.enable_authz();
        assert!(!trail.authz_disabled());
    }

    #[test]
    fn test_nested_sequences_keep_time_invariants() {
        let (clock, mut trail) = manual_trail();
        // depth-first: r(a(b, c), d(e(f)))
        let r = trail.push("r", ArtifactType::Screen, None);
        clock.advance(ms(1));
        trail.push("a", ArtifactType::Service, None);
        clock.advance(ms(2));
        trail.push("b", ArtifactType::Entity, None);
        clock.advance(ms(3));
        trail.pop().unwrap();
        trail.push("c", ArtifactType::Entity, None);
        clock.advance(ms(4));
        trail.pop().unwrap();
        clock.advance(ms(1));
        trail.pop().unwrap();
        trail.push("d", ArtifactType::Service, None);
        trail.push("e", ArtifactType::Service, None);
        clock.advance(ms(7));
        trail.push("f", ArtifactType::Entity, None);
        trail.pop().unwrap();
        trail.pop().unwrap();
        clock.advance(ms(2));
        trail.pop().unwrap();
        clock.advance(ms(1));
        trail.pop().unwrap();

        trail.calc_child_time(r, true).unwrap();
        for node in trail.nodes() {
            let total = node.total_running_time_nanos().unwrap();
            let children: u64 = node
                .children()
                .iter()
                .map(|&c| trail.node(c).unwrap().total_running_time_nanos().unwrap())
                .sum();
            assert!(children <= total, "{} children exceed total", node.name());
            assert_eq!(node.children_running_time_nanos(), Some(children));
        }
        assert_eq!(trail.node(r).unwrap().total_running_time_nanos(), Some(21_000_000));
        assert_eq!(trail.own_time_nanos(r).unwrap(), 2_000_000);
    }

    #[test]
    fn test_max_retained_roots_evicts_oldest() {
        let (_clock, trail) = manual_trail();
        let mut trail = trail.with_max_retained_roots(Some(2));

        let first = trail.push("first", ArtifactType::Service, None);
        trail.push("first.child", ArtifactType::Entity, None);
        trail.pop().unwrap();
        trail.pop().unwrap();
        let second = trail.push("second", ArtifactType::Service, None);
        trail.pop().unwrap();
        let third = trail.push("third", ArtifactType::Service, None);
        let third_child = trail.push("third.child", ArtifactType::Entity, None);

        assert_eq!(trail.roots(), &[second, third]);
        assert_eq!(trail.node(first).unwrap_err(), ArtifactError::UnknownNode(0));
        assert_eq!(trail.node(third_child).unwrap().parent(), Some(third));
        assert_eq!(trail.nodes().len(), 3);
        assert_eq!(trail.completed_roots(), vec![second]);
    }

    #[test]
    fn test_zero_retained_roots_keeps_only_running_tree() {
        let mut trail = ArtifactExecutionTrail::new().with_max_retained_roots(Some(0));
        trail.push("one", ArtifactType::Service, None);
        trail.pop().unwrap();
        let two = trail.push("two", ArtifactType::Service, None);
        assert_eq!(trail.roots(), &[two]);
        assert_eq!(trail.nodes().len(), 1);
    }
}
