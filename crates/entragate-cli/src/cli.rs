use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "entragate",
    about = "Identity-governance automation for Azure subscriptions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP API server.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Backend target. `local` keeps all state in memory.
    #[arg(long, default_value = "local")]
    pub cloud: CloudArg,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Entra tenant for the credential chain.
    #[arg(long, env = "AZURE_TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Azure DevOps organization hosting the vending pipeline.
    #[arg(long, env = "AZDO_ORG")]
    pub azdo_org: Option<String>,

    /// Azure DevOps project hosting the vending pipeline.
    #[arg(long, env = "AZDO_PROJECT")]
    pub azdo_project: Option<String>,

    /// Pipeline id for public-VNet subscriptions.
    #[arg(long, env = "AZDO_PIPELINE_ID_PUBLIC")]
    pub azdo_pipeline_id_public: Option<String>,

    /// Pipeline id for private-VNet subscriptions.
    #[arg(long, env = "AZDO_PIPELINE_ID_PRIVATE")]
    pub azdo_pipeline_id_private: Option<String>,

    /// UTC offset, in hours, used for elevation windows.
    #[arg(long, env = "ELEVATION_OFFSET_HOURS", default_value_t = 9)]
    pub elevation_offset_hours: i32,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CloudArg {
    Local,
    Azure,
}
