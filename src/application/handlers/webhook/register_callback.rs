//! RegisterCallbackHandler - Attaches a forwarding URL to a request.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{RequestId, Timestamp, ValidationError};
use crate::domain::orchestration::OrchestratorError;
use crate::ports::{CallbackError, CallbackRegistry};

/// Expiration used when the caller does not give one.
pub const DEFAULT_EXPIRATION_MINUTES: u32 = 60;

/// Upper bound on a requested expiration (one day).
const MAX_EXPIRATION_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone)]
pub struct RegisterCallbackCommand {
    pub request_id: RequestId,
    pub callback_url: String,
    pub expiration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterCallbackResult {
    pub request_id: RequestId,
    pub expires_at: Timestamp,
}

pub struct RegisterCallbackHandler {
    registry: Arc<dyn CallbackRegistry>,
    default_expiration: u32,
}

impl RegisterCallbackHandler {
    pub fn new(registry: Arc<dyn CallbackRegistry>) -> Self {
        Self {
            registry,
            default_expiration: DEFAULT_EXPIRATION_MINUTES,
        }
    }

    pub fn with_default_expiration(mut self, minutes: u32) -> Self {
        self.default_expiration = minutes.max(1);
        self
    }

    pub async fn handle(
        &self,
        cmd: RegisterCallbackCommand,
    ) -> Result<RegisterCallbackResult, OrchestratorError> {
        // 1. Resolve expiration
        let minutes = cmd.expiration_minutes.unwrap_or(self.default_expiration);
        if minutes == 0 || minutes > MAX_EXPIRATION_MINUTES {
            return Err(ValidationError::out_of_range(
                "expiration_minutes",
                1.0,
                f64::from(MAX_EXPIRATION_MINUTES),
                f64::from(minutes),
            )
            .into());
        }
        let ttl = Duration::from_secs(u64::from(minutes) * 60);

        // 2. Attach URL (creates the entry when no caller waits yet)
        let expires_at = self
            .registry
            .attach_url(cmd.request_id, cmd.callback_url, ttl)
            .await
            .map_err(|e| match e {
                CallbackError::InvalidUrl(_) => {
                    OrchestratorError::Validation(ValidationError::invalid_format("callback_url", e.to_string()))
                }
                other => OrchestratorError::Internal(other.to_string()),
            })?;

        tracing::info!(
            request_id = %cmd.request_id,
            expiration_minutes = minutes,
            "Callback registered"
        );

        Ok(RegisterCallbackResult {
            request_id: cmd.request_id,
            expires_at,
        })
    }
}
