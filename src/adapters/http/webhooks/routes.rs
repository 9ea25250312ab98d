//! Axum router for the webhook endpoints.

use axum::{routing::post, Router};

use super::handlers::{
    anthropic_webhook, custom_webhook, deliver_callback, openai_webhook, register_callback,
    WebhooksAppState,
};

/// Webhook routes, mounted under `/api`.
///
/// These routes carry no user authentication; every delivery is verified by
/// its HMAC signature instead.
pub fn webhooks_router() -> Router<WebhooksAppState> {
    Router::new()
        .route("/webhooks/openai", post(openai_webhook))
        .route("/webhooks/anthropic", post(anthropic_webhook))
        .route("/webhooks/custom", post(custom_webhook))
        .route("/webhooks/callbacks", post(register_callback))
        .route("/webhooks/callbacks/:request_id", post(deliver_callback))
}
