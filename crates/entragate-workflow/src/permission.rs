use tracing::info;

use entragate_azure::{GroupDirectory, IdentityResolver};
use entragate_domain::{entra_group_name, PermissionLabel};

use crate::error::WorkflowError;

/// A request to change standing permissions for a set of accounts on one
/// subscription.
#[derive(Debug, Clone)]
pub struct PermissionRequest {
    pub subscription_name: String,
    pub permission: PermissionLabel,
    pub emails: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum MembershipAction {
    Attach,
    Detach,
}

/// Add every account in the request to the permission's Entra group.
/// Accounts are processed in order; the first failure aborts the remainder
/// and already-applied changes stay in place.
pub async fn assign_permission(
    resolver: &dyn IdentityResolver,
    directory: &dyn GroupDirectory,
    request: &PermissionRequest,
) -> Result<(), WorkflowError> {
    apply(resolver, directory, request, MembershipAction::Attach).await
}

/// Remove every account in the request from the permission's Entra group.
/// Same ordering and failure semantics as assignment.
pub async fn revoke_permission(
    resolver: &dyn IdentityResolver,
    directory: &dyn GroupDirectory,
    request: &PermissionRequest,
) -> Result<(), WorkflowError> {
    apply(resolver, directory, request, MembershipAction::Detach).await
}

async fn apply(
    resolver: &dyn IdentityResolver,
    directory: &dyn GroupDirectory,
    request: &PermissionRequest,
    action: MembershipAction,
) -> Result<(), WorkflowError> {
    let group_name = entra_group_name(&request.subscription_name, request.permission);

    for email in &request.emails {
        let user = resolver.resolve_user(email).await?;

        let memberships = resolver.user_group_names(&user).await?;
        info!(email, user = %user, groups = ?memberships, "current group memberships");

        // The index is rebuilt per account so a group created mid-request
        // is picked up.
        let index = directory.group_index().await?;
        let group = index
            .get(&group_name)
            .ok_or_else(|| WorkflowError::GroupNotFound(group_name.clone()))?;

        let members = directory.group_members(group).await?;
        info!(
            group = %group,
            group_name,
            member_count = members.len(),
            "group membership before change"
        );

        match action {
            MembershipAction::Attach => {
                directory.add_member(group, &user).await?;
                info!(email, group_name, "added user to group");
            }
            MembershipAction::Detach => {
                directory.remove_member(group, &user).await?;
                info!(email, group_name, "removed user from group");
            }
        }
    }
    Ok(())
}
