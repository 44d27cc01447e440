use std::sync::Arc;

use entragate_azure::{GroupDirectory, IdentityResolver, PipelineRunner, SubscriptionCatalog};
use entragate_workflow::ElevationScheduler;

/// Shared handler state. Every dependency is behind a trait object so the
/// same router serves the real Azure clients and the in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<dyn IdentityResolver>,
    pub directory: Arc<dyn GroupDirectory>,
    pub subscriptions: Arc<dyn SubscriptionCatalog>,
    pub elevation: Arc<ElevationScheduler>,
    pub pipeline: Arc<dyn PipelineRunner>,
}
