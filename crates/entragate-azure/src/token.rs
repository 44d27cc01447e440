use std::process::Command as StdCommand;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::AzureError;
use crate::http::{http_client, send_with_retry};

/// Azure Resource Manager token audience.
pub const RESOURCE_MANAGEMENT: &str = "https://management.azure.com";
/// Microsoft Graph token audience.
pub const RESOURCE_GRAPH: &str = "https://graph.microsoft.com";
/// Azure DevOps token audience (well-known application id).
pub const RESOURCE_DEVOPS: &str = "499b84ac-1321-427f-aa17-267ca6975798";

const DEFAULT_LOGIN_BASE: &str = "https://login.microsoftonline.com";

/// Abstraction over Azure token acquisition, one provider per token audience.
/// Enables test injection.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, AzureError>;
}

// ── Service Principal ─────────────────────────────────────────────────────────

pub struct ServicePrincipalTokenProvider {
    tenant_id:     String,
    client_id:     String,
    client_secret: String,
    resource:      String,
    login_base:    String,
    client:        reqwest::Client,
    cache:         Mutex<Option<(String, Instant)>>,
}

impl ServicePrincipalTokenProvider {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id:     tenant_id.into(),
            client_id:     client_id.into(),
            client_secret: client_secret.into(),
            resource:      resource.into(),
            login_base:    DEFAULT_LOGIN_BASE.to_string(),
            client:        http_client(),
            cache:         Mutex::new(None),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_login_base(mut self, base: impl Into<String>) -> Self {
        self.login_base = base.into();
        self
    }
}

#[async_trait]
impl TokenProvider for ServicePrincipalTokenProvider {
    async fn token(&self) -> Result<String, AzureError> {
        {
            let guard = self.cache.lock().await;
            if let Some((tok, expiry)) = guard.as_ref() {
                if Instant::now() < *expiry {
                    return Ok(tok.clone());
                }
            }
        }

        let url = format!("{}/{}/oauth2/v2.0/token", self.login_base, self.tenant_id);
        let scope = format!("{}/.default", self.resource);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("scope", &scope),
        ];
        let resp: Value = send_with_retry(self.client.post(&url).form(&params))
            .await
            .map_err(|e| AzureError::Internal(format!("SP token request: {}", e)))?
            .json()
            .await
            .map_err(|e| AzureError::Internal(format!("SP token decode: {}", e)))?;

        let tok = resp["access_token"]
            .as_str()
            .ok_or_else(|| {
                AzureError::Internal(format!("SP token: no access_token in response: {}", resp))
            })?
            .to_string();
        let expires_in = resp["expires_in"].as_u64().unwrap_or(3600);
        let expiry = Instant::now() + Duration::from_secs(expires_in.saturating_sub(60));

        *self.cache.lock().await = Some((tok.clone(), expiry));
        Ok(tok)
    }
}

// ── Managed Identity (IMDS) ───────────────────────────────────────────────────

pub struct ManagedIdentityTokenProvider {
    resource: String,
    client:   reqwest::Client,
    cache:    Mutex<Option<(String, Instant)>>,
}

impl ManagedIdentityTokenProvider {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            client:   http_client(),
            cache:    Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenProvider for ManagedIdentityTokenProvider {
    async fn token(&self) -> Result<String, AzureError> {
        {
            let guard = self.cache.lock().await;
            if let Some((tok, expiry)) = guard.as_ref() {
                if Instant::now() < *expiry {
                    return Ok(tok.clone());
                }
            }
        }

        let resource = format!("{}/", self.resource.trim_end_matches('/'));
        let resp: Value = send_with_retry(
            self.client
                .get("http://169.254.169.254/metadata/identity/oauth2/token")
                .header("Metadata", "true")
                .query(&[("api-version", "2018-02-01"), ("resource", resource.as_str())]),
        )
        .await
        .map_err(|e| AzureError::Internal(format!("IMDS token request: {}", e)))?
        .json()
        .await
        .map_err(|e| AzureError::Internal(format!("IMDS token decode: {}", e)))?;

        let tok = resp["access_token"]
            .as_str()
            .ok_or_else(|| AzureError::Internal(format!("IMDS token: no access_token: {}", resp)))?
            .to_string();
        let expires_in = resp["expires_in"]
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(3600);
        let expiry = Instant::now() + Duration::from_secs(expires_in.saturating_sub(60));

        *self.cache.lock().await = Some((tok.clone(), expiry));
        Ok(tok)
    }
}

// ── Azure CLI ─────────────────────────────────────────────────────────────────

pub struct AzureCliTokenProvider {
    tenant_id: String,
    resource:  String,
}

impl AzureCliTokenProvider {
    pub fn new(tenant_id: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            resource:  resource.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    async fn token(&self) -> Result<String, AzureError> {
        let output = StdCommand::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                &self.resource,
                "--tenant",
                &self.tenant_id,
                "--output",
                "json",
            ])
            .output()
            .map_err(|e| {
                AzureError::Internal(format!(
                    "az CLI not found: {}. Install Azure CLI or configure service principal credentials.",
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AzureError::Internal(format!(
                "az account get-access-token failed: {}. Run 'az login' first.",
                stderr.trim()
            )));
        }

        let resp: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| AzureError::Internal(format!("az CLI output parse: {}", e)))?;
        let tok = resp["accessToken"]
            .as_str()
            .ok_or_else(|| AzureError::Internal("az CLI: no accessToken in output".into()))?
            .to_string();
        Ok(tok)
    }
}

// ── Static (tests, local mode) ────────────────────────────────────────────────

pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, AzureError> {
        Ok(self.0.clone())
    }
}

// ── Resolution chain ──────────────────────────────────────────────────────────

/// Build a token provider for `resource`, auto-selecting the credential source:
/// 1. `AZURE_CLIENT_ID` + `AZURE_CLIENT_SECRET` env vars → Service Principal
/// 2. `IDENTITY_ENDPOINT` env var → Managed Identity (IMDS)
/// 3. Otherwise → Azure CLI (`az account get-access-token`)
pub fn credential_chain(tenant_id: &str, resource: &str) -> Box<dyn TokenProvider> {
    if let (Ok(cid), Ok(cs)) = (
        std::env::var("AZURE_CLIENT_ID"),
        std::env::var("AZURE_CLIENT_SECRET"),
    ) {
        Box::new(ServicePrincipalTokenProvider::new(tenant_id, cid, cs, resource))
    } else if std::env::var("IDENTITY_ENDPOINT").is_ok() {
        Box::new(ManagedIdentityTokenProvider::new(resource))
    } else {
        Box::new(AzureCliTokenProvider::new(tenant_id, resource))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
