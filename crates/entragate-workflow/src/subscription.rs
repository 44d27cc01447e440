use tracing::info;

use entragate_azure::{PipelineOutcome, PipelineRun, PipelineRunner};
use entragate_domain::{Environment, ManagementGroup, VNetType};

use crate::error::WorkflowError;

/// A request to provision a new Azure subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    pub project_name: String,
    pub environment: Environment,
    pub email: String,
    pub management_group: ManagementGroup,
    pub vnet_type: VNetType,
    pub branch: String,
}

/// Hand the request to the vending pipeline. The pipeline provisions
/// asynchronously; a `Started` outcome only means the run was accepted.
pub async fn create_subscription(
    pipeline: &dyn PipelineRunner,
    request: &SubscriptionRequest,
) -> Result<PipelineOutcome, WorkflowError> {
    let run = PipelineRun {
        project_name: request.project_name.clone(),
        environment: request.environment,
        email: request.email.clone(),
        management_group: request.management_group,
        vnet_type: request.vnet_type,
        branch: request.branch.clone(),
    };
    let outcome = pipeline.run(&run).await?;
    info!(
        project_name = %request.project_name,
        environment = %request.environment,
        outcome = ?outcome,
        "subscription request handed to pipeline"
    );
    Ok(outcome)
}
