//! Error classification: decides whether a failure is surfaced, retried or
//! replaced with fallback content.
//!
//! The classifier never retries anything itself. It reports the recommended
//! action and the caller acts on it.

use serde::Serialize;

use crate::domain::foundation::{RequestId, Timestamp};

use super::{AgentType, OrchestratorError};

/// Recommended reaction to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    Surface,
    Retry,
    Fallback,
}

/// What the caller knows about the failed operation.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: RequestId,
    pub agent_type: Option<AgentType>,
    /// Whether the caller can substitute fallback content.
    pub has_fallback: bool,
    /// 1-based attempt number that just failed.
    pub attempt: u32,
    pub max_attempts: u32,
}

impl ErrorContext {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            agent_type: None,
            has_fallback: false,
            attempt: 1,
            max_attempts: 1,
        }
    }

    pub fn with_agent_type(mut self, agent_type: AgentType) -> Self {
        self.agent_type = Some(agent_type);
        self
    }

    pub fn with_fallback(mut self, has_fallback: bool) -> Self {
        self.has_fallback = has_fallback;
        self
    }

    pub fn with_attempt(mut self, attempt: u32, max_attempts: u32) -> Self {
        self.attempt = attempt;
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn attempts_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }
}

/// Outcome of classifying one error.
#[derive(Debug, Clone)]
pub struct Classification {
    pub action: RecoveryAction,
    pub error: OrchestratorError,
    pub classified_at: Timestamp,
}

/// Classifies `error` and logs the decision.
pub fn classify(error: OrchestratorError, context: &ErrorContext) -> Classification {
    let action = decide(&error, context);
    let classified_at = Timestamp::now();
    let agent_type = context.agent_type.map(|t| t.as_str()).unwrap_or("none");

    match action {
        RecoveryAction::Surface => tracing::warn!(
            request_id = %context.request_id,
            agent_type,
            code = %error.code(),
            classified_at = %classified_at.as_datetime(),
            error = %error,
            "Error surfaced to caller"
        ),
        RecoveryAction::Retry => tracing::info!(
            request_id = %context.request_id,
            agent_type,
            attempt = context.attempt,
            max_attempts = context.max_attempts,
            classified_at = %classified_at.as_datetime(),
            error = %error,
            "Retrying after transient provider error"
        ),
        RecoveryAction::Fallback => tracing::warn!(
            request_id = %context.request_id,
            agent_type,
            classified_at = %classified_at.as_datetime(),
            error = %error,
            "Substituting fallback output"
        ),
    }

    Classification {
        action,
        error,
        classified_at,
    }
}

fn decide(error: &OrchestratorError, context: &ErrorContext) -> RecoveryAction {
    let provider_error = match error {
        OrchestratorError::Provider(e) => e,
        _ => return RecoveryAction::Surface,
    };

    if provider_error.is_timeout() {
        return fallback_or_surface(context);
    }

    if provider_error.is_retryable() && context.attempts_remaining() {
        return RecoveryAction::Retry;
    }

    fallback_or_surface(context)
}

fn fallback_or_surface(context: &ErrorContext) -> RecoveryAction {
    if context.has_fallback {
        RecoveryAction::Fallback
    } else {
        RecoveryAction::Surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ValidationError;
    use crate::domain::orchestration::AIError;

    fn ctx() -> ErrorContext {
        ErrorContext::new(RequestId::new()).with_agent_type(AgentType::AssessmentAnalysis)
    }

    #[test]
    fn validation_errors_always_surface() {
        let err = OrchestratorError::from(ValidationError::empty_field("answers"));
        let result = classify(err, &ctx().with_fallback(true).with_attempt(1, 3));
        assert_eq!(result.action, RecoveryAction::Surface);
        assert!(matches!(result.error, OrchestratorError::Validation(_)));
    }

    #[test]
    fn timeout_falls_back_without_retry() {
        let err = OrchestratorError::from(AIError::Timeout { timeout_secs: 30 });
        let result = classify(err, &ctx().with_fallback(true).with_attempt(1, 3));
        assert_eq!(result.action, RecoveryAction::Fallback);
    }

    #[test]
    fn timeout_surfaces_without_fallback() {
        let err = OrchestratorError::from(AIError::CallbackExpired);
        let result = classify(err, &ctx().with_attempt(1, 3));
        assert_eq!(result.action, RecoveryAction::Surface);
    }

    #[test]
    fn transient_errors_retry_while_budget_remains() {
        let err = OrchestratorError::from(AIError::rate_limited(1));
        let result = classify(err.clone(), &ctx().with_fallback(true).with_attempt(1, 2));
        assert_eq!(result.action, RecoveryAction::Retry);

        let result = classify(err, &ctx().with_fallback(true).with_attempt(2, 2));
        assert_eq!(result.action, RecoveryAction::Fallback);
    }

    #[test]
    fn malformed_output_falls_back() {
        let err = OrchestratorError::from(AIError::parse("not json"));
        let result = classify(err, &ctx().with_fallback(true));
        assert_eq!(result.action, RecoveryAction::Fallback);
    }

    #[test]
    fn provider_error_without_fallback_surfaces() {
        let err = OrchestratorError::from(AIError::unavailable("502"));
        let result = classify(err, &ctx());
        assert_eq!(result.action, RecoveryAction::Surface);
    }

    #[test]
    fn non_provider_errors_surface() {
        for err in [
            OrchestratorError::authentication("bad signature"),
            OrchestratorError::not_found("batch", "x"),
            OrchestratorError::conflict("terminal"),
            OrchestratorError::internal("boom"),
        ] {
            let result = classify(err, &ctx().with_fallback(true));
            assert_eq!(result.action, RecoveryAction::Surface);
        }
    }
}
