//! Request and response bodies for the webhook endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::webhook::{HandleProviderWebhookResult, RegisterCallbackResult};
use crate::domain::foundation::{RequestId, Timestamp};
use crate::domain::webhook::WebhookOutcome;

#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    pub event_id: String,
    pub outcome: WebhookOutcome,
}

impl From<HandleProviderWebhookResult> for WebhookAckResponse {
    fn from(result: HandleProviderWebhookResult) -> Self {
        Self {
            received: true,
            event_id: result.event_id,
            outcome: result.outcome,
        }
    }
}

/// Body of `POST /api/webhooks/callbacks`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCallbackRequest {
    pub request_id: RequestId,
    pub callback_url: String,
    #[serde(default)]
    pub expiration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterCallbackResponse {
    pub request_id: RequestId,
    pub expires_at: Timestamp,
}

impl From<RegisterCallbackResult> for RegisterCallbackResponse {
    fn from(result: RegisterCallbackResult) -> Self {
        Self {
            request_id: result.request_id,
            expires_at: result.expires_at,
        }
    }
}
