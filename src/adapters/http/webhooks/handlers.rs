//! HTTP handlers for the webhook endpoints.
//!
//! Bodies are taken as raw bytes: signatures cover the exact payload.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::webhook::{
    DeliverCallbackCommand, HandleProviderWebhookCommand, HandleProviderWebhookHandler,
    RegisterCallbackCommand, RegisterCallbackHandler,
};
use crate::domain::foundation::{RequestId, ValidationError};
use crate::domain::webhook::WebhookProvider;

use super::dto::{RegisterCallbackRequest, RegisterCallbackResponse, WebhookAckResponse};
use crate::adapters::http::error::ApiError;

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhooksAppState {
    pub webhook_handler: Arc<HandleProviderWebhookHandler>,
    pub register_handler: Arc<RegisterCallbackHandler>,
}

fn signature(headers: &HeaderMap, provider: WebhookProvider) -> Option<String> {
    headers
        .get(provider.signature_header())
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn receive(
    state: WebhooksAppState,
    provider: WebhookProvider,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckResponse>, ApiError> {
    let cmd = HandleProviderWebhookCommand {
        provider,
        signature: signature(&headers, provider),
        payload: body.to_vec(),
    };

    let result = state.webhook_handler.handle(cmd).await?;
    Ok(Json(result.into()))
}

/// POST /api/webhooks/openai
pub async fn openai_webhook(
    State(state): State<WebhooksAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receive(state, WebhookProvider::OpenAI, headers, body).await
}

/// POST /api/webhooks/anthropic
pub async fn anthropic_webhook(
    State(state): State<WebhooksAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receive(state, WebhookProvider::Anthropic, headers, body).await
}

/// POST /api/webhooks/custom
pub async fn custom_webhook(
    State(state): State<WebhooksAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    receive(state, WebhookProvider::Custom, headers, body).await
}

/// POST /api/webhooks/callbacks - Attach a forwarding URL to a request
pub async fn register_callback(
    State(state): State<WebhooksAppState>,
    Json(request): Json<RegisterCallbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RegisterCallbackCommand {
        request_id: request.request_id,
        callback_url: request.callback_url,
        expiration_minutes: request.expiration_minutes,
    };

    let result = state.register_handler.handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(RegisterCallbackResponse::from(result))))
}

/// POST /api/webhooks/callbacks/:request_id - Deliver a signed result
pub async fn deliver_callback(
    State(state): State<WebhooksAppState>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request_id: RequestId = request_id
        .parse()
        .map_err(|_| ValidationError::invalid_format("request_id", "expected a UUID"))?;

    let cmd = DeliverCallbackCommand {
        request_id,
        signature: signature(&headers, WebhookProvider::Custom),
        payload: body.to_vec(),
    };

    let result = state.webhook_handler.deliver(cmd).await?;
    Ok(Json(WebhookAckResponse::from(result)))
}
