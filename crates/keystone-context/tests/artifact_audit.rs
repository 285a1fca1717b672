//! Artifact timing and authorization recorded through a context.

#![allow(clippy::arithmetic_side_effects)]

use std::time::Duration;

use keystone_artifact::{
    ArtifactError, ArtifactType, AuthorizationRecord, AuthzAction, AuthzOutcome, AuthzType,
};
use keystone_context::ContextError;
use keystone_test::test_factory_with_clock;

const MS: u64 = 1_000_000;

#[test]
fn test_service_own_times() {
    let (factory, clock) = test_factory_with_clock();
    let ctx = factory.get_execution_context().unwrap();

    let svc_a = ctx
        .push_artifact("svcA", ArtifactType::Service, Some(AuthzAction::View))
        .unwrap();
    clock.advance(Duration::from_millis(10));
    let svc_b = ctx
        .push_artifact("svcB", ArtifactType::Service, Some(AuthzAction::View))
        .unwrap();
    clock.advance(Duration::from_millis(10));
    ctx.pop_artifact_expecting("svcB").unwrap();
    clock.advance(Duration::from_millis(10));
    ctx.pop_artifact_expecting("svcA").unwrap();

    let (own_a, own_b) = ctx
        .with_trail(|trail| {
            (
                trail.own_time_nanos(svc_a).unwrap(),
                trail.own_time_nanos(svc_b).unwrap(),
            )
        })
        .unwrap();
    assert_eq!(own_a, 20 * MS);
    assert_eq!(own_b, 10 * MS);

    let report = ctx.artifact_report().unwrap();
    assert_eq!(report.total_own_time_nanos(), 30 * MS);
    assert_eq!(report.flat[0].name, "svcA");
    let rendered = ctx.with_trail(|trail| trail.render()).unwrap();
    assert!(rendered.contains("svcB"));
}

#[test]
fn test_unbalanced_pop_fails() {
    let (factory, _) = test_factory_with_clock();
    let ctx = factory.get_execution_context().unwrap();
    ctx.push_artifact("svc", ArtifactType::Service, None).unwrap();
    ctx.pop_artifact().unwrap();
    assert!(matches!(
        ctx.pop_artifact(),
        Err(ContextError::Artifact(ArtifactError::EmptyTrail { .. }))
    ));
}

#[test]
fn test_inherited_authorization_through_nested_calls() {
    let (factory, _) = test_factory_with_clock();
    let ctx = factory.get_execution_context().unwrap();

    ctx.push_artifact("apps/order", ArtifactType::Screen, Some(AuthzAction::View))
        .unwrap();
    ctx.record_authorization(
        AuthorizationRecord::granted(AuthzType::Allow).with_user("john.doe"),
        true,
    )
    .unwrap();
    ctx.push_artifact("order.findOrder", ArtifactType::Service, None)
        .unwrap();
    let pinned = ctx
        .with_trail(|trail| trail.inherit_authorization())
        .unwrap()
        .unwrap();
    assert_eq!(pinned, Some(AuthzOutcome::Granted));
    ctx.push_artifact("order.Order", ArtifactType::Entity, Some(AuthzAction::View))
        .unwrap();

    assert_eq!(
        ctx.current_authorization_allowed().unwrap(),
        Some(AuthzOutcome::Granted)
    );

    ctx.record_authorization(AuthorizationRecord::denied(AuthzType::Deny), false)
        .unwrap();
    assert_eq!(
        ctx.current_authorization_allowed().unwrap(),
        Some(AuthzOutcome::Denied)
    );
    assert!(ctx.message().unwrap().has_error());
}

#[test]
fn test_trail_discarded_on_destroy() {
    let (factory, _) = test_factory_with_clock();
    let ctx = factory.get_execution_context().unwrap();
    ctx.push_artifact("svc", ArtifactType::Service, None).unwrap();
    ctx.destroy();
    assert!(matches!(
        ctx.artifact_report(),
        Err(ContextError::AlreadyDestroyed(_))
    ));
}
