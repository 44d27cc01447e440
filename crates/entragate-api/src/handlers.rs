use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use entragate_azure::PipelineOutcome;
use entragate_domain::{
    validate, Environment, ManagementGroup, PermissionLabel, RoleLabel, VNetType,
};
use entragate_workflow::{
    assign_permission, create_subscription, elevate_privilege, revoke_permission,
    ElevationRequest, PermissionRequest, SubscriptionRequest,
};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_BRANCH: &str = "refs/heads/main";

#[derive(Debug, Serialize)]
pub struct Message {
    #[serde(rename = "Message")]
    pub message: String,
}

impl Message {
    fn new(text: &str) -> Json<Self> {
        Json(Self {
            message: text.to_string(),
        })
    }
}

pub async fn health() -> &'static str {
    "ok"
}

// ── POST /azure/subscription ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscriptionBody {
    #[serde(rename = "ProjectName")]
    project_name: String,
    #[serde(rename = "Environment")]
    environment: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "VNetType")]
    vnet_type: String,
    #[serde(rename = "ManagementGroups")]
    management_groups: String,
    #[serde(default)]
    branch: Option<String>,
}

pub async fn subscription(
    State(state): State<AppState>,
    body: Result<Json<SubscriptionBody>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(body) = body?;
    validate::check_project_name(&body.project_name)?;
    validate::check_email(&body.email)?;
    let request = SubscriptionRequest {
        project_name: body.project_name,
        environment: body.environment.parse::<Environment>()?,
        email: body.email,
        management_group: body.management_groups.parse::<ManagementGroup>()?,
        vnet_type: body.vnet_type.parse::<VNetType>()?,
        branch: body.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
    };

    info!(project_name = %request.project_name, "subscription request received");
    let outcome = create_subscription(state.pipeline.as_ref(), &request).await?;
    let message = match outcome {
        PipelineOutcome::Started => "Azure subscription request accepted",
        PipelineOutcome::NotConfigured => {
            "Request accepted (pipeline not executed: missing configuration)"
        }
    };
    Ok(Message::new(message))
}

// ── POST /azure/permissions/{assign,revoke} ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PermissionBody {
    #[serde(rename = "SubscriptionName")]
    subscription_name: String,
    #[serde(rename = "Permission")]
    permission: String,
    #[serde(rename = "Emails")]
    emails: Vec<String>,
}

impl PermissionBody {
    fn into_request(self) -> Result<PermissionRequest, ApiError> {
        validate::check_emails(&self.emails)?;
        Ok(PermissionRequest {
            subscription_name: self.subscription_name,
            permission: self.permission.parse::<PermissionLabel>()?,
            emails: self.emails,
        })
    }
}

pub async fn permissions_assign(
    State(state): State<AppState>,
    body: Result<Json<PermissionBody>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(body) = body?;
    let request = body.into_request()?;

    info!(
        subscription_name = %request.subscription_name,
        permission = %request.permission,
        accounts = request.emails.len(),
        "permission assign request received"
    );
    assign_permission(state.resolver.as_ref(), state.directory.as_ref(), &request).await?;
    Ok(Message::new("Permission assign request accepted"))
}

pub async fn permissions_revoke(
    State(state): State<AppState>,
    body: Result<Json<PermissionBody>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(body) = body?;
    let request = body.into_request()?;

    info!(
        subscription_name = %request.subscription_name,
        permission = %request.permission,
        accounts = request.emails.len(),
        "permission revoke request received"
    );
    revoke_permission(state.resolver.as_ref(), state.directory.as_ref(), &request).await?;
    Ok(Message::new("Permission revoke request accepted"))
}

// ── POST /azure/privilege/elevations ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ElevationBody {
    #[serde(rename = "ProjectName")]
    project_name: String,
    #[serde(rename = "Environment")]
    environment: String,
    #[serde(rename = "AssignRole")]
    assign_role: String,
    #[serde(rename = "Email")]
    email: String,
    /// Overrides the `subs-<project>-<environment>` default.
    #[serde(rename = "SubscriptionName", default)]
    subscription_name: Option<String>,
}

pub async fn privilege_elevations(
    State(state): State<AppState>,
    body: Result<Json<ElevationBody>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(body) = body?;
    validate::check_project_name(&body.project_name)?;
    validate::check_email(&body.email)?;
    let environment = body.environment.parse::<Environment>()?;
    let subscription_name = body
        .subscription_name
        .unwrap_or_else(|| format!("subs-{}-{}", body.project_name, environment));
    let request = ElevationRequest {
        subscription_name,
        role: body.assign_role.parse::<RoleLabel>()?,
        emails: vec![body.email],
    };

    info!(
        subscription_name = %request.subscription_name,
        role = %request.role,
        "privilege elevation request received"
    );
    elevate_privilege(
        state.resolver.as_ref(),
        state.subscriptions.as_ref(),
        state.elevation.as_ref(),
        &request,
    )
    .await?;
    Ok(Message::new("Privilege elevations request accepted"))
}
