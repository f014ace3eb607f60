use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::sap::client::InvokeError;
use crate::sap::envelope::EnvelopeError;
use crate::sap::extract::ExtractError;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "message": "SAP backend returned an error",
    "details": "<html>Service not found</html>",
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request", "Internal Server Error")
    #[schema(example = "Bad Request")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "customerId is required")]
    pub message: String,
    /// Upstream response body when SAP answered with an error status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    #[schema(example = "2024-12-09T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} is required")]
    MissingField(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("SAP backend returned status {status}")]
    Upstream { status: u16, body: String },

    #[error("No response received from SAP backend: {0}")]
    NoResponse(String),

    #[error("Error setting up SAP request: {0}")]
    RequestSetup(String),

    #[error("Unexpected response structure from SAP: {0}")]
    UnexpectedStructure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<InvokeError> for ServiceError {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Status { status, body } => ServiceError::Upstream { status, body },
            InvokeError::NoResponse(reason) => ServiceError::NoResponse(reason),
            InvokeError::Setup(reason) => ServiceError::RequestSetup(reason),
        }
    }
}

impl From<ExtractError> for ServiceError {
    fn from(err: ExtractError) -> Self {
        ServiceError::UnexpectedStructure(err.to_string())
    }
}

impl From<EnvelopeError> for ServiceError {
    fn from(err: EnvelopeError) -> Self {
        ServiceError::RequestSetup(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::BadRequest(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::NoResponse(_)
            | Self::RequestSetup(_)
            | Self::UnexpectedStructure(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Transport and internal failures return generic messages; the cause is logged instead.
    pub fn response_message(&self) -> String {
        match self {
            Self::Upstream { .. } => "SAP backend returned an error".to_string(),
            Self::NoResponse(_) => "No response received from SAP backend".to_string(),
            Self::RequestSetup(_) => "Error setting up SAP request".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Upstream body forwarded to the caller, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Upstream { body, .. } => Some(body.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::NoResponse(reason) | Self::RequestSetup(reason) | Self::Internal(reason) => {
                tracing::error!(status = status.as_u16(), reason = %reason, "{}", self)
            }
            Self::Upstream { status, .. } => {
                tracing::warn!(upstream_status = *status, "SAP backend returned an error status")
            }
            _ => {}
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
