//! HTTP callback notifier.
//!
//! Forwards a settled asynchronous outcome to the URL registered for the
//! request. The body uses the same shape accepted by the callback delivery
//! endpoint and is signed with the outbound secret in `X-Webhook-Signature`.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::domain::foundation::RequestId;
use crate::domain::orchestration::TokenUsage;
use crate::domain::webhook::{WebhookProvider, WebhookVerifier};
use crate::ports::{CallbackError, CallbackNotifier, CallbackResult};

/// POSTs settled outcomes to registered callback URLs.
pub struct HttpCallbackNotifier {
    client: reqwest::Client,
    signer: WebhookVerifier,
}

impl HttpCallbackNotifier {
    pub fn new(signing_secret: impl Into<String>, timeout: Duration) -> Result<Self, CallbackError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CallbackError::Delivery(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            signer: WebhookVerifier::new(signing_secret),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum DeliveryStatus {
    Completed,
    Failed,
}

#[derive(Debug, Serialize)]
struct UsageBody {
    prompt_tokens: u32,
    completion_tokens: u32,
    cost_cents: u32,
}

impl From<&TokenUsage> for UsageBody {
    fn from(usage: &TokenUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cost_cents: usage.estimated_cost_cents,
        }
    }
}

#[derive(Debug, Serialize)]
struct NotificationBody {
    event_id: String,
    request_id: RequestId,
    status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<UsageBody>,
}

impl NotificationBody {
    fn new(request_id: RequestId, result: &CallbackResult) -> Self {
        let event_id = format!("callback-{}", request_id);
        match result {
            Ok(completed) => Self {
                event_id,
                request_id,
                status: DeliveryStatus::Completed,
                content: Some(completed.content.clone()),
                model: Some(completed.model.clone()),
                error: None,
                usage: Some(UsageBody::from(&completed.usage)),
            },
            Err(err) => Self {
                event_id,
                request_id,
                status: DeliveryStatus::Failed,
                content: None,
                model: None,
                error: Some(err.to_string()),
                usage: None,
            },
        }
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn notify(
        &self,
        callback_url: &str,
        request_id: RequestId,
        result: &CallbackResult,
    ) -> Result<(), CallbackError> {
        let body = serde_json::to_vec(&NotificationBody::new(request_id, result))
            .map_err(|e| CallbackError::Delivery(e.to_string()))?;
        let signature = self
            .signer
            .sign(&body)
            .map_err(|e| CallbackError::Delivery(e.to_string()))?;

        let response = self
            .client
            .post(callback_url)
            .header("Content-Type", "application/json")
            .header(
                WebhookProvider::Custom.signature_header(),
                format!("sha256={}", signature),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| CallbackError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CallbackError::Delivery(format!(
                "callback url responded {}",
                response.status()
            )));
        }

        tracing::info!(request_id = %request_id, callback_url, "Callback forwarded");
        Ok(())
    }
}
