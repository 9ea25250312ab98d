//! HandleProviderWebhookHandler - Verifies, deduplicates and dispatches
//! provider webhooks.
//!
//! Processing order:
//! 1. Verify the HMAC signature of the raw body (before any parsing)
//! 2. Parse the body against the provider schema
//! 3. Skip events already processed
//! 4. Dispatch: settle the pending callback and record metrics
//! 5. Record the event for idempotency

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::RequestId;
use crate::domain::orchestration::AIError;
use crate::domain::webhook::{
    parse_callback_delivery, parse_event, ProviderWebhookEvent, WebhookError, WebhookEventKind,
    WebhookEventRecord, WebhookOutcome, WebhookProvider, WebhookVerifier,
};
use crate::ports::{
    CallStatus, CallbackNotifier, CallbackRegistry, CallbackResult, CompletedCallback,
    ProcessedWebhookStore, ProviderMetricsRecord, ProviderMetricsRecorder, ResolveOutcome,
    SaveResult,
};

/// Command carrying one inbound provider webhook.
#[derive(Debug, Clone)]
pub struct HandleProviderWebhookCommand {
    pub provider: WebhookProvider,
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Value of the provider's signature header.
    pub signature: Option<String>,
}

/// Command carrying a signed result for one pending request.
#[derive(Debug, Clone)]
pub struct DeliverCallbackCommand {
    pub request_id: RequestId,
    pub payload: Vec<u8>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandleProviderWebhookResult {
    pub event_id: String,
    pub outcome: WebhookOutcome,
}

/// What dispatching one event did.
enum Dispatch {
    Processed,
    Ignored(String),
}

/// Handler for inbound provider webhooks and callback deliveries.
pub struct HandleProviderWebhookHandler {
    verifiers: HashMap<WebhookProvider, WebhookVerifier>,
    store: Arc<dyn ProcessedWebhookStore>,
    callbacks: Arc<dyn CallbackRegistry>,
    notifier: Option<Arc<dyn CallbackNotifier>>,
    metrics: Arc<dyn ProviderMetricsRecorder>,
}

impl HandleProviderWebhookHandler {
    pub fn new(
        store: Arc<dyn ProcessedWebhookStore>,
        callbacks: Arc<dyn CallbackRegistry>,
        metrics: Arc<dyn ProviderMetricsRecorder>,
    ) -> Self {
        Self {
            verifiers: HashMap::new(),
            store,
            callbacks,
            notifier: None,
            metrics,
        }
    }

    /// Sets the shared secret used to verify a provider's signatures.
    pub fn with_secret(mut self, provider: WebhookProvider, secret: impl Into<String>) -> Self {
        self.verifiers.insert(provider, WebhookVerifier::new(secret));
        self
    }

    /// Forwards settled outcomes to registered callback URLs.
    pub fn with_notifier(mut self, notifier: Arc<dyn CallbackNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn handle(
        &self,
        cmd: HandleProviderWebhookCommand,
    ) -> Result<HandleProviderWebhookResult, WebhookError> {
        // 1. Verify signature over the raw bytes
        self.verify(cmd.provider, &cmd.payload, cmd.signature.as_deref())?;

        // 2. Parse against the provider schema
        let event = parse_event(cmd.provider, &cmd.payload)?;

        // 3-5. Deduplicate, dispatch, record
        self.process(event).await
    }

    /// Handles a result delivered for one request on the custom channel.
    pub async fn deliver(
        &self,
        cmd: DeliverCallbackCommand,
    ) -> Result<HandleProviderWebhookResult, WebhookError> {
        self.verify(WebhookProvider::Custom, &cmd.payload, cmd.signature.as_deref())?;
        let event = parse_callback_delivery(cmd.request_id, &cmd.payload)?;
        self.process(event).await
    }

    fn verify(
        &self,
        provider: WebhookProvider,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<(), WebhookError> {
        let verifier = self.verifiers.get(&provider).ok_or_else(|| {
            tracing::error!(provider = provider.as_str(), "No webhook secret configured");
            WebhookError::InvalidSignature
        })?;

        verifier.verify(payload, signature).map_err(|e| {
            tracing::warn!(provider = provider.as_str(), error = %e, "Webhook signature rejected");
            e
        })
    }

    async fn process(
        &self,
        event: ProviderWebhookEvent,
    ) -> Result<HandleProviderWebhookResult, WebhookError> {
        let event_id = event.event_id.clone();

        // Replays are acknowledged without side effects
        if self.store.find_by_event_id(&event_id).await?.is_some() {
            tracing::info!(
                event_id = %event_id,
                provider = event.provider.as_str(),
                "Webhook already processed"
            );
            return Ok(HandleProviderWebhookResult {
                event_id,
                outcome: WebhookOutcome::AlreadyProcessed,
            });
        }

        let dispatch = self.dispatch(&event).await;

        let record = match &dispatch {
            Dispatch::Processed => WebhookEventRecord::success(&event),
            Dispatch::Ignored(reason) => WebhookEventRecord::ignored(&event, reason.clone()),
        };

        match self.store.save(record).await? {
            SaveResult::Inserted => {}
            SaveResult::AlreadyExists => {
                // Concurrent delivery won the race
                return Ok(HandleProviderWebhookResult {
                    event_id,
                    outcome: WebhookOutcome::AlreadyProcessed,
                });
            }
        }

        let outcome = match dispatch {
            Dispatch::Processed => WebhookOutcome::Processed,
            Dispatch::Ignored(reason) => {
                tracing::info!(event_id = %event_id, reason = %reason, "Webhook ignored");
                WebhookOutcome::Ignored
            }
        };

        Ok(HandleProviderWebhookResult { event_id, outcome })
    }

    async fn dispatch(&self, event: &ProviderWebhookEvent) -> Dispatch {
        let provider = event.provider.as_str();

        match &event.kind {
            WebhookEventKind::CompletionSucceeded {
                request_id,
                content,
                model,
                usage,
            } => {
                let result: CallbackResult = Ok(CompletedCallback {
                    content: content.clone(),
                    model: model.clone(),
                    usage: usage.clone(),
                });
                let settled = self.settle(*request_id, &result).await;
                if settled {
                    let record = ProviderMetricsRecord::new(provider, Some(*request_id), CallStatus::Success)
                        .with_usage(usage.clone());
                    self.metrics.record(record).await;
                    tracing::info!(
                        event_id = %event.event_id,
                        provider,
                        request_id = %request_id,
                        "Pending completion resolved"
                    );
                    Dispatch::Processed
                } else {
                    Dispatch::Ignored(format!("no pending callback for {}", request_id))
                }
            }

            WebhookEventKind::CompletionFailed { request_id, error } => {
                let result: CallbackResult = Err(AIError::callback_rejected(error.clone()));
                let settled = self.settle(*request_id, &result).await;
                if settled {
                    let record = ProviderMetricsRecord::new(provider, Some(*request_id), CallStatus::Failure);
                    self.metrics.record(record).await;
                    tracing::warn!(
                        event_id = %event.event_id,
                        provider,
                        request_id = %request_id,
                        error = %error,
                        "Pending completion rejected"
                    );
                    Dispatch::Processed
                } else {
                    Dispatch::Ignored(format!("no pending callback for {}", request_id))
                }
            }

            WebhookEventKind::UsageUpdated { request_id, usage } => {
                let record =
                    ProviderMetricsRecord::new(provider, *request_id, CallStatus::Usage).with_usage(usage.clone());
                self.metrics.record(record).await;
                Dispatch::Processed
            }

            WebhookEventKind::Unhandled { event_type } => {
                Dispatch::Ignored(format!("unhandled event type {}", event_type))
            }
        }
    }

    /// Settles the pending callback. Returns false when nothing was waiting.
    async fn settle(&self, request_id: RequestId, result: &CallbackResult) -> bool {
        let callback_url = match self.callbacks.resolve(request_id, result.clone()).await {
            ResolveOutcome::Resolved { callback_url } => callback_url,
            ResolveOutcome::NotFound => return false,
        };

        // Forwarding is best effort; the event is processed either way
        if let (Some(url), Some(notifier)) = (callback_url, &self.notifier) {
            if let Err(e) = notifier.notify(&url, request_id, result).await {
                tracing::warn!(request_id = %request_id, callback_url = %url, error = %e, "Callback forwarding failed");
            }
        }
        true
    }
}
