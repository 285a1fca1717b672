//! Keystone Artifact - execution trail of nested artifact invocations.
//!
//! Every screen, service, entity operation or REST path that runs inside an
//! execution context is pushed onto an [`ArtifactExecutionTrail`] when it
//! starts and popped when it finishes. The trail keeps:
//! - the live stack of open invocations
//! - the tree of completed invocations, for "where did the time go" reports
//! - the authorization outcome recorded on each invocation, with inheritance
//!   from ancestors that allow it
//!
//! Nodes live in an arena and are addressed by [`NodeId`], so the tree has no
//! back-pointers to keep alive and serializes without cycles.
//!
//! # Example
//!
//! ```
//! use keystone_artifact::{
//!     ArtifactExecutionTrail, ArtifactType, AuthorizationRecord, AuthzAction, AuthzOutcome,
//!     AuthzType, ManualClock,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut trail = ArtifactExecutionTrail::with_clock(Arc::new(clock.clone()));
//!
//! trail.push("order.OrderServices.create#Order", ArtifactType::Service, Some(AuthzAction::Create));
//! trail
//!     .record_authorization(AuthorizationRecord::granted(AuthzType::Allow).with_user("john.doe"), true)
//!     .unwrap();
//!
//! trail.push("mantle.order.OrderHeader", ArtifactType::Entity, Some(AuthzAction::Create));
//! assert_eq!(trail.current_authorization_allowed(), Some(AuthzOutcome::Granted));
//!
//! clock.advance(Duration::from_millis(10));
//! let entity = trail.pop().unwrap();
//! clock.advance(Duration::from_millis(20));
//! let service = trail.pop().unwrap();
//!
//! assert_eq!(trail.own_time_nanos(service).unwrap(), 20_000_000);
//! assert_eq!(trail.own_time_nanos(entity).unwrap(), 10_000_000);
//!
//! let report = trail.consolidate(&[service]).unwrap();
//! assert_eq!(report.total_own_time_nanos(), 30_000_000);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod clock;
mod error;
mod node;
mod report;
mod trail;
mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{ArtifactError, ArtifactResult};
pub use node::{ArtifactExecutionNode, NodeId};
pub use report::{ArtifactKey, ArtifactStats, ConsolidatedNode, ConsolidatedReport};
pub use trail::ArtifactExecutionTrail;
pub use types::{ArtifactType, AuthorizationRecord, AuthzAction, AuthzOutcome, AuthzType};
