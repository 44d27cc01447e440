use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use entragate_domain::VNetType;

use crate::error::AzureError;
use crate::http::{http_client, send_with_retry};
use crate::service::{PipelineOutcome, PipelineRun, PipelineRunner};
use crate::token::TokenProvider;

const DEFAULT_DEVOPS_BASE: &str = "https://dev.azure.com";

const PIPELINES_API_VERSION: &str = "7.0";

/// Azure DevOps pipeline coordinates. Any missing field means the
/// deployment pipeline is not configured for this installation.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub organization:        Option<String>,
    pub project:             Option<String>,
    pub pipeline_id_public:  Option<String>,
    pub pipeline_id_private: Option<String>,
}

/// Triggers the subscription-vending pipeline in Azure DevOps.
pub struct PipelineClient {
    client: reqwest::Client,
    token:  Box<dyn TokenProvider>,
    config: PipelineConfig,
    base:   String,
}

impl PipelineClient {
    pub fn new(token: Box<dyn TokenProvider>, config: PipelineConfig) -> Self {
        Self {
            client: http_client(),
            token,
            config,
            base: DEFAULT_DEVOPS_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base(
        token: Box<dyn TokenProvider>,
        config: PipelineConfig,
        base: impl Into<String>,
    ) -> Self {
        Self {
            client: http_client(),
            token,
            config,
            base: base.into(),
        }
    }

    fn pipeline_id(&self, vnet_type: VNetType) -> Option<&str> {
        match vnet_type {
            VNetType::Public => self.config.pipeline_id_public.as_deref(),
            VNetType::Private => self.config.pipeline_id_private.as_deref(),
        }
    }
}

#[async_trait]
impl PipelineRunner for PipelineClient {
    async fn run(&self, run: &PipelineRun) -> Result<PipelineOutcome, AzureError> {
        let (Some(org), Some(project), Some(pipeline_id)) = (
            self.config.organization.as_deref(),
            self.config.project.as_deref(),
            self.pipeline_id(run.vnet_type),
        ) else {
            warn!(
                project_name = %run.project_name,
                vnet_type = ?run.vnet_type,
                "pipeline not configured, skipping run"
            );
            return Ok(PipelineOutcome::NotConfigured);
        };

        let token = self.token.token().await?;
        let url = format!(
            "{}/{}/{}/_apis/pipelines/{}/runs?api-version={}",
            self.base, org, project, pipeline_id, PIPELINES_API_VERSION,
        );
        let body = json!({
            "resources": {
                "repositories": {
                    "self": { "refName": run.branch }
                }
            },
            "templateParameters": {
                "project_name": run.project_name,
                "environment_id": run.environment.to_string(),
                "email": run.email,
                "management_group_id": run.management_group.to_string(),
            },
        });

        debug!(url, project_name = %run.project_name, "starting pipeline run");
        let resp = send_with_retry(self.client.post(&url).bearer_auth(&token).json(&body))
            .await
            .map_err(|e| AzureError::Downstream(format!("POST {}: {}", url, e)))?;
        let status = resp.status();
        if status.is_success() {
            info!(project_name = %run.project_name, pipeline_id, "pipeline run started");
            return Ok(PipelineOutcome::Started);
        }

        let text = resp.text().await.unwrap_or_default();
        let detail: String = text.chars().take(500).collect();
        Err(AzureError::Downstream(format!(
            "Pipeline start failed: status {}: {}",
            status.as_u16(),
            detail
        )))
    }
}
