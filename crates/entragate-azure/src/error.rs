use thiserror::Error;

#[derive(Debug, Error)]
pub enum AzureError {
    /// The caller named something that does not exist in Azure: an unknown
    /// user, group, or subscription. Maps to a client error at the HTTP edge.
    #[error("{0}")]
    NotFound(String),

    /// A downstream service rejected or failed the request. Remote state is
    /// unknown; the caller reports a generic failure.
    #[error("downstream request failed: {0}")]
    Downstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}
