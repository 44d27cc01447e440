use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use entragate_azure::AzureError;
use entragate_domain::DomainError;
use entragate_workflow::WorkflowError;

/// An error response. Clients get a fixed message per status; the concrete
/// cause is logged, never returned.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn validation() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation error or missing parameters".to_string(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "Message": self.message }))).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        error!(%err, "request validation failed");
        ApiError::validation()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        error!(%err, "request processing failed");
        // Naming something that does not exist is the caller's mistake.
        match err {
            WorkflowError::GroupNotFound(_) => ApiError::validation(),
            WorkflowError::Azure(AzureError::NotFound(_)) => ApiError::validation(),
            WorkflowError::Azure(_) => ApiError::internal(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        error!(%rejection, "malformed request body");
        ApiError::validation()
    }
}
