//! Orchestration on top of the directory, subscription, PIM and pipeline
//! clients: standing group-permission changes, time-boxed role elevations,
//! and subscription creation.

pub mod elevation;
pub mod error;
pub mod permission;
pub mod subscription;

pub use elevation::{elevate_privilege, ElevationRequest, ElevationScheduler};
pub use error::WorkflowError;
pub use permission::{assign_permission, revoke_permission, PermissionRequest};
pub use subscription::{create_subscription, SubscriptionRequest};
