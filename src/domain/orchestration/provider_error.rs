//! Upstream provider failure vocabulary.

/// AI provider errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Context (prompt + history) exceeds model limit.
    #[error("context too long: {tokens} tokens exceeds {max} limit")]
    ContextTooLong { tokens: u32, max: u32 },

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// Provider is unavailable (5xx or no backend configured).
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response or its payload.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// The provider reported failure through its completion webhook.
    #[error("provider reported failure: {0}")]
    CallbackRejected(String),

    /// No completion webhook arrived before the pending callback expired.
    #[error("pending callback expired")]
    CallbackExpired,
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn context_too_long(tokens: u32, max: u32) -> Self {
        Self::ContextTooLong { tokens, max }
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_secs: timeout.as_secs().min(u32::MAX as u64) as u32,
        }
    }

    pub fn callback_rejected(message: impl Into<String>) -> Self {
        Self::CallbackRejected(message.into())
    }

    /// Returns true if another attempt (same or next backend) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }

    /// Returns true for failures caused by waiting too long.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AIError::Timeout { .. } | AIError::CallbackExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn retryable_classification() {
        assert!(AIError::rate_limited(30).is_retryable());
        assert!(AIError::unavailable("down").is_retryable());
        assert!(AIError::network("reset").is_retryable());
        assert!(AIError::Timeout { timeout_secs: 30 }.is_retryable());

        assert!(!AIError::AuthenticationFailed.is_retryable());
        assert!(!AIError::context_too_long(100, 50).is_retryable());
        assert!(!AIError::parse("bad json").is_retryable());
        assert!(!AIError::CallbackExpired.is_retryable());
    }

    #[test]
    fn timeout_helper_rounds_to_seconds() {
        let err = AIError::timeout(Duration::from_millis(2500));
        assert_eq!(err, AIError::Timeout { timeout_secs: 2 });
        assert!(err.is_timeout());
        assert!(AIError::CallbackExpired.is_timeout());
    }

    #[test]
    fn displays_correctly() {
        assert_eq!(
            AIError::rate_limited(30).to_string(),
            "rate limited: retry after 30s"
        );
        assert_eq!(
            AIError::callback_rejected("overloaded").to_string(),
            "provider reported failure: overloaded"
        );
    }
}
