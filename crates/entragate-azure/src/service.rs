use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use entragate_domain::{Environment, GroupId, ManagementGroup, SubscriptionId, UserId, VNetType};

use crate::error::AzureError;

// ── Directory ─────────────────────────────────────────────────────────────────

/// One member of a directory group, as returned by the members listing.
/// Used for audit logging around membership mutation.
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub id: UserId,
    pub user_principal_name: Option<String>,
}

#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    /// Resolve a user principal name (email) to the directory object id.
    /// An unknown principal is a hard failure for that account.
    async fn resolve_user(&self, upn: &str) -> Result<UserId, AzureError>;

    /// Display names of the directory groups the user belongs to. Directory
    /// objects of any other kind are filtered out.
    async fn user_group_names(&self, user: &UserId) -> Result<Vec<String>, AzureError>;
}

#[async_trait]
pub trait GroupDirectory: Send + Sync + 'static {
    /// Enumerate every group in the directory, keyed by display name.
    /// Built fresh on every call; never cached across requests.
    async fn group_index(&self) -> Result<HashMap<String, GroupId>, AzureError>;

    async fn group_members(&self, group: &GroupId) -> Result<Vec<GroupMember>, AzureError>;

    /// Add a user to a group. Adding a user that is already a member is a
    /// non-fatal success.
    async fn add_member(&self, group: &GroupId, user: &UserId) -> Result<(), AzureError>;

    /// Remove a user from a group. Removing a user that is not a member is a
    /// non-fatal success.
    async fn remove_member(&self, group: &GroupId, user: &UserId) -> Result<(), AzureError>;
}

// ── Subscriptions ─────────────────────────────────────────────────────────────

#[async_trait]
pub trait SubscriptionCatalog: Send + Sync + 'static {
    /// Resolve a subscription display name to its GUID by exact case-sensitive
    /// match over the enumerable subscription list.
    async fn subscription_id_by_name(
        &self,
        display_name: &str,
    ) -> Result<SubscriptionId, AzureError>;
}

// ── PIM scheduling ────────────────────────────────────────────────────────────

/// A fully-computed PIM role-assignment schedule request, ready to submit.
/// Built per (request, account); submitted once, never retried by the caller.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Authorization scope rooted at the subscription path
    /// (`/providers/Microsoft.Subscription/subscriptions/<id>/`).
    pub scope: String,
    /// Fully-qualified role definition resource id.
    pub role_definition_id: String,
    pub principal_id: UserId,
    /// Correlation id; becomes the schedule request name downstream. Not
    /// deduplicated; the downstream service owns conflict detection.
    pub request_id: Uuid,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[async_trait]
pub trait RoleScheduler: Send + Sync + 'static {
    async fn submit(&self, request: &ScheduleRequest) -> Result<(), AzureError>;
}

// ── Pipeline trigger ──────────────────────────────────────────────────────────

/// Parameters forwarded to the subscription-creation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub project_name: String,
    pub environment: Environment,
    pub email: String,
    pub management_group: ManagementGroup,
    pub vnet_type: VNetType,
    /// Repository ref the pipeline runs against.
    pub branch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Started,
    /// Pipeline settings are absent; the request is accepted but nothing ran.
    NotConfigured,
}

#[async_trait]
pub trait PipelineRunner: Send + Sync + 'static {
    async fn run(&self, run: &PipelineRun) -> Result<PipelineOutcome, AzureError>;
}
