use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use entragate_domain::{GroupId, UserId};

use crate::error::AzureError;
use crate::http::{http_client, send_with_retry};
use crate::service::{GroupDirectory, GroupMember, IdentityResolver};
use crate::token::TokenProvider;

const DEFAULT_GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Page size requested on collection endpoints.
const PAGE_SIZE: u32 = 999;

// ── Directory object tagging ──────────────────────────────────────────────────

/// A `memberOf` entry. Graph returns heterogeneous directory objects; only
/// group objects contribute to membership display names, everything else
/// (administrative units, directory roles) falls into `Other`.
#[derive(Debug, Deserialize)]
#[serde(tag = "@odata.type")]
enum DirectoryObject {
    #[serde(rename = "#microsoft.graph.group")]
    Group {
        #[serde(rename = "displayName")]
        display_name: Option<String>,
    },
    #[serde(other)]
    Other,
}

// ── GraphClient ───────────────────────────────────────────────────────────────

/// Microsoft Graph client for directory principal and group operations.
/// Holds no directory state: every lookup is a fresh round trip.
pub struct GraphClient {
    client: reqwest::Client,
    token:  Box<dyn TokenProvider>,
    base:   String,
}

impl GraphClient {
    pub fn new(token: Box<dyn TokenProvider>) -> Self {
        Self {
            client: http_client(),
            token,
            base: DEFAULT_GRAPH_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base(token: Box<dyn TokenProvider>, base: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            token,
            base: base.into(),
        }
    }

    async fn get(&self, url: &str) -> Result<(reqwest::StatusCode, Value), AzureError> {
        let token = self.token.token().await?;
        debug!(url, "Graph GET");
        let resp = send_with_retry(self.client.get(url).bearer_auth(&token))
            .await
            .map_err(|e| AzureError::Downstream(format!("GET {}: {}", url, e)))?;
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// Collect `value` arrays across `@odata.nextLink` pages.
    async fn get_all_pages(&self, first_url: String) -> Result<Vec<Value>, AzureError> {
        let mut entries = Vec::new();
        let mut next = Some(first_url);

        while let Some(url) = next {
            let (status, body) = self.get(&url).await?;
            if !status.is_success() {
                return Err(AzureError::Downstream(format!(
                    "GET {}: status {}: {}",
                    url,
                    status.as_u16(),
                    parse_graph_error(&body)
                )));
            }
            if let Some(page) = body["value"].as_array() {
                entries.extend(page.iter().cloned());
            }
            next = body["@odata.nextLink"].as_str().map(String::from);
        }

        Ok(entries)
    }
}

// ── URL encoding helper (no extra dep needed) ─────────────────────────────────

/// Percent-encode a caller-supplied path segment. UPNs pass email validation
/// but may still contain characters (`?`, `#`) that would split the URL.
fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

fn parse_graph_error(body: &Value) -> String {
    let err = body.get("error").unwrap_or(body);
    let code = err["code"].as_str().unwrap_or("Unknown");
    let message = err["message"].as_str().unwrap_or("unknown error");
    format!("{}: {}", code, message)
}

// ── IdentityResolver ──────────────────────────────────────────────────────────

#[async_trait]
impl IdentityResolver for GraphClient {
    async fn resolve_user(&self, upn: &str) -> Result<UserId, AzureError> {
        let url = format!(
            "{}/users/{}?$select=id,userPrincipalName",
            self.base,
            encode_path_segment(upn)
        );
        let (status, body) = self.get(&url).await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AzureError::NotFound(format!("User '{}' is not found", upn)));
        }
        if !status.is_success() {
            return Err(AzureError::Downstream(format!(
                "user lookup '{}': status {}: {}",
                upn,
                status.as_u16(),
                parse_graph_error(&body)
            )));
        }

        let id = body["id"].as_str().ok_or_else(|| {
            AzureError::Internal(format!("user lookup '{}': no id in response", upn))
        })?;
        Ok(UserId::new(id))
    }

    async fn user_group_names(&self, user: &UserId) -> Result<Vec<String>, AzureError> {
        let url = format!(
            "{}/users/{}/memberOf?$select=id,displayName&$top={}",
            self.base, user, PAGE_SIZE
        );
        let entries = self.get_all_pages(url).await?;

        let mut names = Vec::new();
        for entry in entries {
            if let Ok(DirectoryObject::Group {
                display_name: Some(name),
            }) = serde_json::from_value::<DirectoryObject>(entry)
            {
                names.push(name);
            }
        }
        Ok(names)
    }
}

// ── GroupDirectory ────────────────────────────────────────────────────────────

#[async_trait]
impl GroupDirectory for GraphClient {
    async fn group_index(&self) -> Result<HashMap<String, GroupId>, AzureError> {
        let url = format!("{}/groups?$select=id,displayName&$top={}", self.base, PAGE_SIZE);
        let entries = self.get_all_pages(url).await?;

        let mut index = HashMap::with_capacity(entries.len());
        for entry in entries {
            let (Some(name), Some(id)) = (entry["displayName"].as_str(), entry["id"].as_str())
            else {
                continue;
            };
            index.insert(name.to_string(), GroupId::new(id));
        }
        Ok(index)
    }

    async fn group_members(&self, group: &GroupId) -> Result<Vec<GroupMember>, AzureError> {
        let url = format!(
            "{}/groups/{}/members?$select=id,userPrincipalName&$top={}",
            self.base, group, PAGE_SIZE
        );
        let entries = self.get_all_pages(url).await?;

        let mut members = Vec::new();
        for entry in entries {
            let Some(id) = entry["id"].as_str() else {
                continue;
            };
            members.push(GroupMember {
                id: UserId::new(id),
                user_principal_name: entry["userPrincipalName"].as_str().map(String::from),
            });
        }
        Ok(members)
    }

    async fn add_member(&self, group: &GroupId, user: &UserId) -> Result<(), AzureError> {
        let token = self.token.token().await?;
        let url = format!("{}/groups/{}/members/$ref", self.base, group);
        let body = json!({
            "@odata.id": format!("{}/directoryObjects/{}", self.base, user),
        });

        debug!(%group, %user, "Graph add member");
        let resp = send_with_retry(self.client.post(&url).bearer_auth(&token).json(&body))
            .await
            .map_err(|e| AzureError::Downstream(format!("POST {}: {}", url, e)))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        let detail = parse_graph_error(&body);

        // The directory rejects a duplicate add with a 400 "already exist"
        // reference error. Treat it as already-member success.
        if status == reqwest::StatusCode::BAD_REQUEST
            && detail.to_lowercase().contains("already exist")
        {
            info!(%group, %user, "user is already a group member");
            return Ok(());
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AzureError::NotFound(format!(
                "Group or user is not found: {}",
                detail
            )));
        }
        Err(AzureError::Downstream(format!(
            "add member to group {}: status {}: {}",
            group,
            status.as_u16(),
            detail
        )))
    }

    async fn remove_member(&self, group: &GroupId, user: &UserId) -> Result<(), AzureError> {
        let token = self.token.token().await?;
        let url = format!("{}/groups/{}/members/{}/$ref", self.base, group, user);

        debug!(%group, %user, "Graph remove member");
        let resp = send_with_retry(self.client.delete(&url).bearer_auth(&token))
            .await
            .map_err(|e| AzureError::Downstream(format!("DELETE {}: {}", url, e)))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        // 404 means the user is not (or no longer) a member. Already-detached
        // is success; the group id itself was resolved via the index upstream.
        if status == reqwest::StatusCode::NOT_FOUND {
            info!(%group, %user, "user is not a group member, nothing to remove");
            return Ok(());
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Err(AzureError::Downstream(format!(
            "remove member from group {}: status {}: {}",
            group,
            status.as_u16(),
            parse_graph_error(&body)
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
