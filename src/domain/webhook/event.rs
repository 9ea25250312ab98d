//! Normalized provider events and the processing record kept per event.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RequestId, Timestamp};
use crate::domain::orchestration::TokenUsage;

use super::WebhookProvider;

/// A provider webhook after signature verification and schema parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderWebhookEvent {
    /// Provider-assigned identifier; the idempotency key.
    pub event_id: String,
    pub provider: WebhookProvider,
    pub kind: WebhookEventKind,
    pub received_at: Timestamp,
}

/// What happened upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookEventKind {
    CompletionSucceeded {
        request_id: RequestId,
        content: String,
        model: String,
        usage: TokenUsage,
    },
    CompletionFailed {
        request_id: RequestId,
        error: String,
    },
    UsageUpdated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
        usage: TokenUsage,
    },
    /// An event type this service does not act on.
    Unhandled { event_type: String },
}

impl ProviderWebhookEvent {
    pub fn new(event_id: impl Into<String>, provider: WebhookProvider, kind: WebhookEventKind) -> Self {
        Self {
            event_id: event_id.into(),
            provider,
            kind,
            received_at: Timestamp::now(),
        }
    }

    /// Stable type name used in logs and processing records.
    pub fn event_type(&self) -> &str {
        match &self.kind {
            WebhookEventKind::CompletionSucceeded { .. } => "completion_succeeded",
            WebhookEventKind::CompletionFailed { .. } => "completion_failed",
            WebhookEventKind::UsageUpdated { .. } => "usage_updated",
            WebhookEventKind::Unhandled { event_type } => event_type,
        }
    }

    pub fn request_id(&self) -> Option<RequestId> {
        match &self.kind {
            WebhookEventKind::CompletionSucceeded { request_id, .. }
            | WebhookEventKind::CompletionFailed { request_id, .. } => Some(*request_id),
            WebhookEventKind::UsageUpdated { request_id, .. } => *request_id,
            WebhookEventKind::Unhandled { .. } => None,
        }
    }
}

/// Result of processing a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Event was processed.
    Processed,
    /// Event was acknowledged without action.
    Ignored,
    /// Event was already processed (idempotent skip).
    AlreadyProcessed,
}

/// How processing of one event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingResult {
    Success,
    Ignored,
    Failed,
}

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEventRecord {
    pub event_id: String,
    pub provider: WebhookProvider,
    pub event_type: String,
    pub processed_at: Timestamp,
    pub result: ProcessingResult,
    /// Reason for ignoring, or the failure message.
    pub message: Option<String>,
}

impl WebhookEventRecord {
    pub fn success(event: &ProviderWebhookEvent) -> Self {
        Self::with_result(event, ProcessingResult::Success, None)
    }

    pub fn ignored(event: &ProviderWebhookEvent, reason: impl Into<String>) -> Self {
        Self::with_result(event, ProcessingResult::Ignored, Some(reason.into()))
    }

    pub fn failed(event: &ProviderWebhookEvent, error: impl Into<String>) -> Self {
        Self::with_result(event, ProcessingResult::Failed, Some(error.into()))
    }

    fn with_result(
        event: &ProviderWebhookEvent,
        result: ProcessingResult,
        message: Option<String>,
    ) -> Self {
        Self {
            event_id: event.event_id.clone(),
            provider: event.provider,
            event_type: event.event_type().to_string(),
            processed_at: Timestamp::now(),
            result,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: WebhookEventKind) -> ProviderWebhookEvent {
        ProviderWebhookEvent::new("evt_1", WebhookProvider::OpenAI, kind)
    }

    #[test]
    fn request_id_follows_kind() {
        let id = RequestId::new();
        let failed = event(WebhookEventKind::CompletionFailed {
            request_id: id,
            error: "boom".to_string(),
        });
        assert_eq!(failed.request_id(), Some(id));
        assert_eq!(failed.event_type(), "completion_failed");

        let unhandled = event(WebhookEventKind::Unhandled {
            event_type: "batch.created".to_string(),
        });
        assert_eq!(unhandled.request_id(), None);
        assert_eq!(unhandled.event_type(), "batch.created");
    }

    #[test]
    fn records_capture_result() {
        let e = event(WebhookEventKind::UsageUpdated {
            request_id: None,
            usage: TokenUsage::new(10, 5, 1),
        });
        let record = WebhookEventRecord::ignored(&e, "no pending request");
        assert_eq!(record.result, ProcessingResult::Ignored);
        assert_eq!(record.event_type, "usage_updated");
        assert_eq!(record.message.as_deref(), Some("no pending request"));
        assert_eq!(WebhookEventRecord::success(&e).message, None);
    }
}
