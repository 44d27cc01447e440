use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use chrono::FixedOffset;

use entragate_azure::{
    credential_chain, ArmClient, GraphClient, GroupDirectory, IdentityResolver,
    InMemoryDirectory, InMemoryScheduler, InMemorySubscriptions, LocalPipeline, PipelineClient,
    PipelineConfig, PipelineRunner, RoleScheduler, SubscriptionCatalog, RESOURCE_DEVOPS,
    RESOURCE_GRAPH, RESOURCE_MANAGEMENT,
};
use entragate_workflow::ElevationScheduler;

use crate::cli::{CloudArg, ServeArgs};

pub async fn serve(args: ServeArgs) -> Result<()> {
    let offset = FixedOffset::east_opt(args.elevation_offset_hours * 3600)
        .context("--elevation-offset-hours is out of range")?;

    let app = match args.cloud {
        CloudArg::Local => {
            info!("starting API server with in-memory backends");
            let directory = Arc::new(InMemoryDirectory::new());
            let subscriptions = Arc::new(InMemorySubscriptions::new());
            let scheduler: Arc<dyn RoleScheduler> = Arc::new(InMemoryScheduler::new());
            let pipeline = Arc::new(LocalPipeline::new());
            entragate_api::build_app(
                directory.clone(),
                directory,
                subscriptions,
                Arc::new(ElevationScheduler::new(scheduler, offset)),
                pipeline,
            )
        }
        CloudArg::Azure => {
            let tenant_id = args
                .tenant_id
                .context("--tenant-id (or AZURE_TENANT_ID) is required for --cloud azure")?;

            let graph = Arc::new(GraphClient::new(credential_chain(
                &tenant_id,
                RESOURCE_GRAPH,
            )));
            let arm = Arc::new(ArmClient::new(credential_chain(
                &tenant_id,
                RESOURCE_MANAGEMENT,
            )));
            let pipeline_config = PipelineConfig {
                organization: args.azdo_org,
                project: args.azdo_project,
                pipeline_id_public: args.azdo_pipeline_id_public,
                pipeline_id_private: args.azdo_pipeline_id_private,
            };
            let pipeline: Arc<dyn PipelineRunner> = Arc::new(PipelineClient::new(
                credential_chain(&tenant_id, RESOURCE_DEVOPS),
                pipeline_config,
            ));

            info!("starting API server with Azure backends");
            let resolver: Arc<dyn IdentityResolver> = graph.clone();
            let directory: Arc<dyn GroupDirectory> = graph;
            let subscriptions: Arc<dyn SubscriptionCatalog> = arm.clone();
            let scheduler: Arc<dyn RoleScheduler> = arm;
            entragate_api::build_app(
                resolver,
                directory,
                subscriptions,
                Arc::new(ElevationScheduler::new(scheduler, offset)),
                pipeline,
            )
        }
    };

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
