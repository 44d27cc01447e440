//! In-memory fakes for local runs and tests. No network, no persistence;
//! state lives for the lifetime of the process.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use entragate_domain::{GroupId, SubscriptionId, UserId};

use crate::error::AzureError;
use crate::service::{
    GroupDirectory, GroupMember, IdentityResolver, PipelineOutcome, PipelineRun, PipelineRunner,
    RoleScheduler, ScheduleRequest, SubscriptionCatalog,
};

// ── Directory ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct DirectoryState {
    // upn -> user object id
    users:   HashMap<String, UserId>,
    // display name -> group object id
    groups:  HashMap<String, GroupId>,
    members: HashMap<GroupId, HashSet<UserId>>,
}

/// A process-local stand-in for the directory. Seed users and groups up
/// front; membership mutates under the same idempotency rules as the real
/// directory.
#[derive(Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, upn: &str, id: &str) -> UserId {
        let user = UserId::new(id);
        self.state
            .write()
            .await
            .users
            .insert(upn.to_string(), user.clone());
        user
    }

    pub async fn add_group(&self, display_name: &str, id: &str) -> GroupId {
        let group = GroupId::new(id);
        let mut state = self.state.write().await;
        state.groups.insert(display_name.to_string(), group.clone());
        state.members.entry(group.clone()).or_default();
        group
    }

    pub async fn members_of(&self, group: &GroupId) -> Vec<UserId> {
        let state = self.state.read().await;
        state
            .members
            .get(group)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IdentityResolver for InMemoryDirectory {
    async fn resolve_user(&self, upn: &str) -> Result<UserId, AzureError> {
        let state = self.state.read().await;
        state
            .users
            .get(upn)
            .cloned()
            .ok_or_else(|| AzureError::NotFound(format!("User '{}' is not found", upn)))
    }

    async fn user_group_names(&self, user: &UserId) -> Result<Vec<String>, AzureError> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .groups
            .iter()
            .filter(|(_, gid)| {
                state
                    .members
                    .get(*gid)
                    .is_some_and(|set| set.contains(user))
            })
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl GroupDirectory for InMemoryDirectory {
    async fn group_index(&self) -> Result<HashMap<String, GroupId>, AzureError> {
        Ok(self.state.read().await.groups.clone())
    }

    async fn group_members(&self, group: &GroupId) -> Result<Vec<GroupMember>, AzureError> {
        let state = self.state.read().await;
        let members = state
            .members
            .get(group)
            .ok_or_else(|| AzureError::NotFound(format!("Group '{}' is not found", group)))?;
        Ok(members
            .iter()
            .map(|id| GroupMember {
                id: id.clone(),
                user_principal_name: state
                    .users
                    .iter()
                    .find(|(_, uid)| *uid == id)
                    .map(|(upn, _)| upn.clone()),
            })
            .collect())
    }

    async fn add_member(&self, group: &GroupId, user: &UserId) -> Result<(), AzureError> {
        let mut state = self.state.write().await;
        let members = state
            .members
            .get_mut(group)
            .ok_or_else(|| AzureError::NotFound(format!("Group '{}' is not found", group)))?;
        if !members.insert(user.clone()) {
            info!(%group, %user, "user is already a member, nothing to do");
        }
        Ok(())
    }

    async fn remove_member(&self, group: &GroupId, user: &UserId) -> Result<(), AzureError> {
        let mut state = self.state.write().await;
        let members = state
            .members
            .get_mut(group)
            .ok_or_else(|| AzureError::NotFound(format!("Group '{}' is not found", group)))?;
        if !members.remove(user) {
            info!(%group, %user, "user is not a member, nothing to do");
        }
        Ok(())
    }
}

// ── Subscriptions ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemorySubscriptions {
    by_name: RwLock<HashMap<String, SubscriptionId>>,
}

impl InMemorySubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, display_name: &str, id: &str) {
        self.by_name
            .write()
            .await
            .insert(display_name.to_string(), SubscriptionId::new(id));
    }
}

#[async_trait]
impl SubscriptionCatalog for InMemorySubscriptions {
    async fn subscription_id_by_name(
        &self,
        display_name: &str,
    ) -> Result<SubscriptionId, AzureError> {
        self.by_name
            .read()
            .await
            .get(display_name)
            .cloned()
            .ok_or_else(|| AzureError::NotFound("Subscription is not found".to_string()))
    }
}

// ── PIM scheduling ────────────────────────────────────────────────────────────

/// Records submitted schedule requests instead of calling out to PIM.
#[derive(Default)]
pub struct InMemoryScheduler {
    submitted: Mutex<Vec<ScheduleRequest>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<ScheduleRequest> {
        self.submitted
            .lock()
            .map(|reqs| reqs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RoleScheduler for InMemoryScheduler {
    async fn submit(&self, request: &ScheduleRequest) -> Result<(), AzureError> {
        info!(
            request_id = %request.request_id,
            principal = %request.principal_id,
            scope = %request.scope,
            "recording schedule request"
        );
        self.submitted
            .lock()
            .map_err(|_| AzureError::Internal("scheduler state poisoned".to_string()))?
            .push(request.clone());
        Ok(())
    }
}

// ── Pipeline trigger ──────────────────────────────────────────────────────────

/// Records pipeline runs instead of calling Azure DevOps.
#[derive(Default)]
pub struct LocalPipeline {
    runs: Mutex<Vec<PipelineRun>>,
}

impl LocalPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<PipelineRun> {
        self.runs
            .lock()
            .map(|runs| runs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PipelineRunner for LocalPipeline {
    async fn run(&self, run: &PipelineRun) -> Result<PipelineOutcome, AzureError> {
        info!(project_name = %run.project_name, "recording pipeline run");
        self.runs
            .lock()
            .map_err(|_| AzureError::Internal("pipeline state poisoned".to_string()))?
            .push(run.clone());
        Ok(PipelineOutcome::Started)
    }
}
