//! Webhook module - Inbound provider notifications.
//!
//! - `WebhookVerifier` - HMAC-SHA256 signature check over the raw body
//! - `parse_event` - per-provider payload schemas mapped to `ProviderWebhookEvent`
//! - `WebhookEventRecord` - idempotency record per processed event

mod errors;
mod event;
mod payloads;
mod provider;
mod verifier;

pub use errors::WebhookError;
pub use event::{
    ProcessingResult, ProviderWebhookEvent, WebhookEventKind, WebhookEventRecord, WebhookOutcome,
};
pub use payloads::{parse_callback_delivery, parse_event};
pub use provider::WebhookProvider;
pub use verifier::WebhookVerifier;
