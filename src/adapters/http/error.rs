//! HTTP error mapping shared by every router.

use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ErrorCode, ValidationError};
use crate::domain::orchestration::OrchestratorError;
use crate::domain::webhook::WebhookError;

/// Error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error type that converts orchestration errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(OrchestratorError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.code() {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::BatchNotFound | ErrorCode::RequestNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,
            ErrorCode::InvalidSignature => StatusCode::UNAUTHORIZED,
            ErrorCode::AIProviderError | ErrorCode::RateLimited => StatusCode::BAD_GATEWAY,
            ErrorCode::CacheError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        let mut body = ErrorResponse::new(self.0.code().to_string(), self.0.to_string());
        if let OrchestratorError::Validation(validation) = &self.0 {
            body = body.with_details(serde_json::json!({ "field": validation.field() }));
        }
        (status, Json(body)).into_response()
    }
}
