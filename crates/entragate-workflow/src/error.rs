use entragate_azure::AzureError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The Entra group derived from the subscription name and permission
    /// does not exist in the directory.
    #[error("Group '{0}' is not found")]
    GroupNotFound(String),

    #[error(transparent)]
    Azure(#[from] AzureError),
}
