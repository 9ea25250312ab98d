//! Webhook error types for provider callbacks.

use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::domain::orchestration::OrchestratorError;

/// Errors that occur during webhook processing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WebhookError {
    /// Signature header absent or empty.
    #[error("Missing signature")]
    MissingSignature,

    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Body is not valid JSON or does not match the provider schema.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Processed-event store failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebhookError {
    /// Returns true if the provider should redeliver the event.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Storage(_))
    }
}

impl From<WebhookError> for OrchestratorError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                OrchestratorError::authentication(err.to_string())
            }
            WebhookError::ParseError(reason) => OrchestratorError::Validation(
                ValidationError::invalid_format("body", reason),
            ),
            WebhookError::MissingField(field) => {
                OrchestratorError::Validation(ValidationError::empty_field(field))
            }
            WebhookError::Ignored(reason) => OrchestratorError::conflict(reason),
            WebhookError::Storage(reason) => OrchestratorError::internal(reason),
        }
    }
}
