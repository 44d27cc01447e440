use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use tracing::info;
use uuid::Uuid;

use entragate_azure::{
    IdentityResolver, RoleScheduler, ScheduleRequest, SubscriptionCatalog,
};
use entragate_domain::{RoleLabel, SubscriptionId, UserId};

use crate::error::WorkflowError;

/// A request for time-boxed role elevations on one subscription.
#[derive(Debug, Clone)]
pub struct ElevationRequest {
    pub subscription_name: String,
    pub role: RoleLabel,
    pub emails: Vec<String>,
}

/// Builds and submits PIM role-assignment schedule requests. Elevation
/// windows start now (in the configured offset) and run for the role's
/// fixed duration.
pub struct ElevationScheduler {
    scheduler: Arc<dyn RoleScheduler>,
    offset: FixedOffset,
}

impl ElevationScheduler {
    pub fn new(scheduler: Arc<dyn RoleScheduler>, offset: FixedOffset) -> Self {
        Self { scheduler, offset }
    }

    /// The elevation window for a role, anchored at `now`.
    pub fn window(
        &self,
        role: RoleLabel,
        now: DateTime<Utc>,
    ) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        let start = now.with_timezone(&self.offset);
        let end = start + Duration::minutes(role.duration_minutes());
        (start, end)
    }

    /// Submit one schedule request granting `role` on `subscription` to
    /// `principal`. Returns the correlation id of the submitted request.
    pub async fn grant(
        &self,
        subscription: &SubscriptionId,
        role: RoleLabel,
        principal: &UserId,
    ) -> Result<Uuid, WorkflowError> {
        let (start, end) = self.window(role, Utc::now());
        let request_id = Uuid::new_v4();
        let request = ScheduleRequest {
            scope: format!(
                "/providers/Microsoft.Subscription/subscriptions/{}/",
                subscription
            ),
            role_definition_id: format!(
                "/subscriptions/{}/providers/Microsoft.Authorization/roleDefinitions/{}",
                subscription,
                role.definition_id()
            ),
            principal_id: principal.clone(),
            request_id,
            start,
            end,
        };
        self.scheduler.submit(&request).await?;
        Ok(request_id)
    }
}

/// Grant the requested role to every account in the request. The
/// subscription is resolved once, before any grant; accounts are then
/// processed in order and the first failure aborts the remainder.
pub async fn elevate_privilege(
    resolver: &dyn IdentityResolver,
    subscriptions: &dyn SubscriptionCatalog,
    scheduler: &ElevationScheduler,
    request: &ElevationRequest,
) -> Result<(), WorkflowError> {
    let subscription = subscriptions
        .subscription_id_by_name(&request.subscription_name)
        .await?;
    info!(
        subscription_name = %request.subscription_name,
        subscription = %subscription,
        role = %request.role,
        "resolved subscription for elevation"
    );

    for email in &request.emails {
        let user = resolver.resolve_user(email).await?;

        let memberships = resolver.user_group_names(&user).await?;
        info!(email, user = %user, groups = ?memberships, "current group memberships");

        let request_id = scheduler.grant(&subscription, request.role, &user).await?;
        info!(
            email,
            user = %user,
            role = %request.role,
            request_id = %request_id,
            "elevation scheduled"
        );
    }
    Ok(())
}
