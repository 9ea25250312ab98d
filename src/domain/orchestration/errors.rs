//! Orchestrator-wide error taxonomy.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, ValidationError};

use super::AIError;

/// Errors surfaced by orchestration components.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestratorError {
    /// Malformed caller input. Always surfaced.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Upstream failure, timeout or malformed output.
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    /// Signature mismatch on an inbound webhook.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Unknown batch, request or callback identifier.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Transition attempted on a terminal batch.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Router or orchestrator fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrchestratorError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            OrchestratorError::Validation(_) => ErrorCode::ValidationFailed,
            OrchestratorError::Provider(AIError::RateLimited { .. }) => ErrorCode::RateLimited,
            OrchestratorError::Provider(_) => ErrorCode::AIProviderError,
            OrchestratorError::Authentication(_) => ErrorCode::InvalidSignature,
            OrchestratorError::NotFound { resource, .. } if *resource == "batch" => {
                ErrorCode::BatchNotFound
            }
            OrchestratorError::NotFound { .. } => ErrorCode::RequestNotFound,
            OrchestratorError::Conflict(_) => ErrorCode::InvalidStateTransition,
            OrchestratorError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_variant() {
        assert_eq!(
            OrchestratorError::from(ValidationError::empty_field("x")).code(),
            ErrorCode::ValidationFailed
        );
        assert_eq!(
            OrchestratorError::from(AIError::rate_limited(5)).code(),
            ErrorCode::RateLimited
        );
        assert_eq!(
            OrchestratorError::not_found("batch", "b-1").code(),
            ErrorCode::BatchNotFound
        );
        assert_eq!(
            OrchestratorError::not_found("callback", "r-1").code(),
            ErrorCode::RequestNotFound
        );
    }

    #[test]
    fn not_found_displays_resource() {
        let err = OrchestratorError::not_found("batch", "abc");
        assert_eq!(err.to_string(), "batch not found: abc");
    }
}
