use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Entra ID directory principal object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(s: impl Into<String>) -> Self {
        UserId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entra ID directory group object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(s: impl Into<String>) -> Self {
        GroupId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Azure subscription GUID (not the human-readable display name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    pub fn new(s: impl Into<String>) -> Self {
        SubscriptionId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Permission labels ─────────────────────────────────────────────────────────

/// Standing-permission level granted through Entra group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLabel {
    Admin,
    Developer,
    Operator,
}

impl PermissionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLabel::Admin => "admin",
            PermissionLabel::Developer => "developer",
            PermissionLabel::Operator => "operator",
        }
    }
}

impl std::fmt::Display for PermissionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLabel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(PermissionLabel::Admin),
            "developer" => Ok(PermissionLabel::Developer),
            "operator" => Ok(PermissionLabel::Operator),
            other => Err(DomainError::InvalidPermission(other.to_string())),
        }
    }
}

/// Map a subscription display name and permission label to the Entra group that
/// carries the corresponding standing grant.
///
/// `subs-<project>-<env>` + `developer` → `azure-<project>-<env>-group-developer`.
/// Pure string transform; performs no directory call.
pub fn entra_group_name(subscription_name: &str, permission: PermissionLabel) -> String {
    let pj_usage_env = subscription_name
        .strip_prefix("subs-")
        .unwrap_or(subscription_name);
    format!("azure-{}-group-{}", pj_usage_env, permission)
}

// ── Role labels ───────────────────────────────────────────────────────────────

/// Azure built-in role definition id for Owner. Same GUID across all tenants.
const ROLE_ID_OWNER: &str = "8e3af657-a8ff-443c-a75c-2fe8c4bcb635";
/// Azure built-in role definition id for Contributor.
const ROLE_ID_CONTRIBUTOR: &str = "b24988ac-6180-42a0-ab88-20f7382dd24c";

/// Role granted through a time-boxed PIM schedule request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleLabel {
    Owner,
    Contributor,
}

impl RoleLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleLabel::Owner => "owner",
            RoleLabel::Contributor => "contributor",
        }
    }

    /// The built-in role definition GUID this label elevates to.
    pub fn definition_id(&self) -> &'static str {
        match self {
            RoleLabel::Owner => ROLE_ID_OWNER,
            RoleLabel::Contributor => ROLE_ID_CONTRIBUTOR,
        }
    }

    /// How long an elevation for this role stays active.
    pub fn duration_minutes(&self) -> i64 {
        match self {
            RoleLabel::Owner => 120,
            RoleLabel::Contributor => 480,
        }
    }
}

impl std::fmt::Display for RoleLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleLabel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(RoleLabel::Owner),
            "contributor" => Ok(RoleLabel::Contributor),
            other => Err(DomainError::InvalidAssignRole(other.to_string())),
        }
    }
}

// ── Subscription-creation enums ───────────────────────────────────────────────

/// Deployment environment identifier. Parsed case-insensitively; callers send
/// mixed-case values and the pipeline expects the lowercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Cmn,
    Dev,
    Stg,
    Prd,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Cmn => "cmn",
            Environment::Dev => "dev",
            Environment::Stg => "stg",
            Environment::Prd => "prd",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cmn" => Ok(Environment::Cmn),
            "dev" => Ok(Environment::Dev),
            "stg" => Ok(Environment::Stg),
            "prd" => Ok(Environment::Prd),
            _ => Err(DomainError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// VNet topology requested for a new subscription; selects the pipeline that
/// provisions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VNetType {
    Private,
    Public,
}

impl VNetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VNetType::Private => "private",
            VNetType::Public => "public",
        }
    }
}

impl std::fmt::Display for VNetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VNetType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "private" => Ok(VNetType::Private),
            "public" => Ok(VNetType::Public),
            _ => Err(DomainError::InvalidVNetType(s.to_string())),
        }
    }
}

/// Management group a new subscription is parented under. Exact-match values;
/// forwarded to the pipeline verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagementGroup {
    Confidential,
    NonConfidential,
    Sandbox,
}

impl ManagementGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagementGroup::Confidential => "Confidential",
            ManagementGroup::NonConfidential => "NonConfidential",
            ManagementGroup::Sandbox => "Sandbox",
        }
    }
}

impl std::fmt::Display for ManagementGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManagementGroup {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confidential" => Ok(ManagementGroup::Confidential),
            "NonConfidential" => Ok(ManagementGroup::NonConfidential),
            "Sandbox" => Ok(ManagementGroup::Sandbox),
            other => Err(DomainError::InvalidManagementGroup(other.to_string())),
        }
    }
}
