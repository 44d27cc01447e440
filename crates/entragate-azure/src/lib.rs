pub mod arm;
pub mod error;
pub mod graph;
mod http;
pub mod memory;
pub mod pipeline;
pub mod service;
pub mod token;

pub use arm::ArmClient;
pub use error::AzureError;
pub use graph::GraphClient;
pub use memory::{InMemoryDirectory, InMemoryScheduler, InMemorySubscriptions, LocalPipeline};
pub use pipeline::{PipelineClient, PipelineConfig};
pub use service::{
    GroupDirectory, GroupMember, IdentityResolver, PipelineOutcome, PipelineRun, PipelineRunner,
    RoleScheduler, ScheduleRequest, SubscriptionCatalog,
};
pub use token::{
    credential_chain, StaticToken, TokenProvider, RESOURCE_DEVOPS, RESOURCE_GRAPH,
    RESOURCE_MANAGEMENT,
};
