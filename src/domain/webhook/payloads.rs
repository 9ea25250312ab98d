//! Provider webhook payload schemas.
//!
//! Each provider sends an envelope with an event id, an event type and a
//! type-specific body. Only fields relevant to our processing are captured;
//! everything is mapped onto [`ProviderWebhookEvent`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::RequestId;
use crate::domain::orchestration::TokenUsage;

use super::{ProviderWebhookEvent, WebhookError, WebhookEventKind, WebhookProvider};

/// Parses a verified body according to the provider's schema.
pub fn parse_event(
    provider: WebhookProvider,
    body: &[u8],
) -> Result<ProviderWebhookEvent, WebhookError> {
    match provider {
        WebhookProvider::OpenAI => parse_openai(body),
        WebhookProvider::Anthropic => parse_anthropic(body),
        WebhookProvider::Custom => parse_custom(body),
    }
}

/// Parses a direct result delivery for one pending request.
///
/// The event id defaults to one derived from the request id, so repeated
/// deliveries for the same request are duplicates.
pub fn parse_callback_delivery(
    request_id: RequestId,
    body: &[u8],
) -> Result<ProviderWebhookEvent, WebhookError> {
    let delivery: CallbackDelivery = from_slice(body)?;
    let event_id = delivery
        .event_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("callback-{}", request_id));

    let kind = match delivery.status {
        DeliveryStatus::Completed => WebhookEventKind::CompletionSucceeded {
            request_id,
            content: require_text(delivery.content, "content")?,
            model: delivery.model.unwrap_or_default(),
            usage: delivery.usage.map(CustomUsage::into_usage).unwrap_or_default(),
        },
        DeliveryStatus::Failed => WebhookEventKind::CompletionFailed {
            request_id,
            error: delivery
                .error
                .unwrap_or_else(|| "provider reported failure".to_string()),
        },
    };
    Ok(ProviderWebhookEvent::new(event_id, WebhookProvider::Custom, kind))
}

fn from_slice<T: DeserializeOwned>(body: &[u8]) -> Result<T, WebhookError> {
    serde_json::from_slice(body).map_err(|e| WebhookError::ParseError(e.to_string()))
}

fn from_value<T: DeserializeOwned>(data: Value) -> Result<T, WebhookError> {
    serde_json::from_value(data).map_err(|e| WebhookError::ParseError(e.to_string()))
}

fn require_text(value: Option<String>, field: &'static str) -> Result<String, WebhookError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(WebhookError::MissingField(field))
}

fn require_event_id(id: String) -> Result<String, WebhookError> {
    require_text(Some(id), "id")
}

/// `{ "id", "type", "data" }`, shared by OpenAI and Anthropic.
#[derive(Debug, Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ProviderUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    cost_cents: u32,
}

impl ProviderUsage {
    fn into_usage(self) -> TokenUsage {
        TokenUsage::new(self.input_tokens, self.output_tokens, self.cost_cents)
    }
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ProviderErrorBody {
    fn describe(error: Option<ProviderErrorBody>) -> String {
        error
            .and_then(|e| e.message.or(e.kind))
            .unwrap_or_else(|| "provider reported failure".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct UsageData {
    #[serde(default)]
    request_id: Option<RequestId>,
    usage: ProviderUsage,
}

// ════════════════════════════════════════════════════════════════════════════════
// OpenAI
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct OpenAIResponseData {
    request_id: RequestId,
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ProviderUsage>,
    #[serde(default)]
    error: Option<ProviderErrorBody>,
}

fn parse_openai(body: &[u8]) -> Result<ProviderWebhookEvent, WebhookError> {
    let envelope: Envelope = from_slice(body)?;
    let event_id = require_event_id(envelope.id)?;

    let kind = match envelope.event_type.as_str() {
        "response.completed" => {
            let data: OpenAIResponseData = from_value(envelope.data)?;
            WebhookEventKind::CompletionSucceeded {
                request_id: data.request_id,
                content: require_text(data.output_text, "output_text")?,
                model: data.model.unwrap_or_default(),
                usage: data.usage.map(ProviderUsage::into_usage).unwrap_or_default(),
            }
        }
        "response.failed" | "response.cancelled" | "response.incomplete" => {
            let data: OpenAIResponseData = from_value(envelope.data)?;
            WebhookEventKind::CompletionFailed {
                request_id: data.request_id,
                error: ProviderErrorBody::describe(data.error),
            }
        }
        "usage.updated" => {
            let data: UsageData = from_value(envelope.data)?;
            WebhookEventKind::UsageUpdated {
                request_id: data.request_id,
                usage: data.usage.into_usage(),
            }
        }
        other => WebhookEventKind::Unhandled {
            event_type: other.to_string(),
        },
    };
    Ok(ProviderWebhookEvent::new(event_id, WebhookProvider::OpenAI, kind))
}

// ════════════════════════════════════════════════════════════════════════════════
// Anthropic
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicMessageData {
    request_id: RequestId,
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ProviderUsage>,
    #[serde(default)]
    error: Option<ProviderErrorBody>,
}

impl AnthropicMessageData {
    fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        Some(text)
    }
}

fn parse_anthropic(body: &[u8]) -> Result<ProviderWebhookEvent, WebhookError> {
    let envelope: Envelope = from_slice(body)?;
    let event_id = require_event_id(envelope.id)?;

    let kind = match envelope.event_type.as_str() {
        "message.completed" => {
            let data: AnthropicMessageData = from_value(envelope.data)?;
            WebhookEventKind::CompletionSucceeded {
                request_id: data.request_id,
                content: require_text(data.text(), "content")?,
                model: data.model.unwrap_or_default(),
                usage: data.usage.map(ProviderUsage::into_usage).unwrap_or_default(),
            }
        }
        "message.failed" => {
            let data: AnthropicMessageData = from_value(envelope.data)?;
            WebhookEventKind::CompletionFailed {
                request_id: data.request_id,
                error: ProviderErrorBody::describe(data.error),
            }
        }
        "usage.reported" => {
            let data: UsageData = from_value(envelope.data)?;
            WebhookEventKind::UsageUpdated {
                request_id: data.request_id,
                usage: data.usage.into_usage(),
            }
        }
        other => WebhookEventKind::Unhandled {
            event_type: other.to_string(),
        },
    };
    Ok(ProviderWebhookEvent::new(event_id, WebhookProvider::Anthropic, kind))
}

// ════════════════════════════════════════════════════════════════════════════════
// Custom
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct CustomUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    cost_cents: u32,
}

impl CustomUsage {
    fn into_usage(self) -> TokenUsage {
        TokenUsage::new(self.prompt_tokens, self.completion_tokens, self.cost_cents)
    }
}

#[derive(Debug, Deserialize)]
struct CustomEvent {
    event_id: String,
    event: String,
    #[serde(default)]
    request_id: Option<RequestId>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    usage: Option<CustomUsage>,
}

fn parse_custom(body: &[u8]) -> Result<ProviderWebhookEvent, WebhookError> {
    let event: CustomEvent = from_slice(body)?;
    let event_id = require_text(Some(event.event_id), "event_id")?;

    let kind = match event.event.as_str() {
        "completion.succeeded" => WebhookEventKind::CompletionSucceeded {
            request_id: event.request_id.ok_or(WebhookError::MissingField("request_id"))?,
            content: require_text(event.content, "content")?,
            model: event.model.unwrap_or_default(),
            usage: event.usage.map(CustomUsage::into_usage).unwrap_or_default(),
        },
        "completion.failed" => WebhookEventKind::CompletionFailed {
            request_id: event.request_id.ok_or(WebhookError::MissingField("request_id"))?,
            error: event
                .error
                .unwrap_or_else(|| "provider reported failure".to_string()),
        },
        "usage.updated" => WebhookEventKind::UsageUpdated {
            request_id: event.request_id,
            usage: event
                .usage
                .ok_or(WebhookError::MissingField("usage"))?
                .into_usage(),
        },
        other => WebhookEventKind::Unhandled {
            event_type: other.to_string(),
        },
    };
    Ok(ProviderWebhookEvent::new(event_id, WebhookProvider::Custom, kind))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DeliveryStatus {
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
struct CallbackDelivery {
    #[serde(default)]
    event_id: Option<String>,
    status: DeliveryStatus,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    usage: Option<CustomUsage>,
}
