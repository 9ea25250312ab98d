//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Provider Ports
//!
//! - `AIProvider` - One upstream language-model backend
//! - `RequestRouter` - Backend selection, failover and timeouts over providers
//! - `ProviderMetricsRecorder` - Append-only call metrics
//!
//! ## Storage Ports
//!
//! - `ResponseCacheStore` - Fingerprint-keyed response storage
//! - `BatchJobRepository` - Batch job state
//! - `InteractionHistory` - Recent interactions used as prompt context
//! - `ProcessedWebhookStore` - Webhook idempotency tracking
//!
//! ## Asynchronous Completion Ports
//!
//! - `CallbackRegistry` - Pending completions awaiting a webhook
//! - `CallbackNotifier` - Forwards settled outcomes to registered URLs
//!
//! ## Execution Ports
//!
//! - `AgentExecutor` - Runs one resolved agent invocation (used by batches)

mod agent_executor;
mod ai_provider;
mod batch_job_repository;
mod callback_registry;
mod interaction_history;
mod provider_metrics;
mod request_router;
mod response_cache;
mod webhook_event_store;

pub use agent_executor::AgentExecutor;
pub use ai_provider::{
    AIError, AIProvider, CompletionMode, CompletionRequest, CompletionResponse, FinishReason,
    Message, MessageRole, ProviderInfo, RequestMetadata, SubmittedJob, TokenUsage,
};
pub use batch_job_repository::{BatchCounts, BatchJobRepository, JobMutation};
pub use callback_registry::{
    CallbackError, CallbackNotifier, CallbackRegistry, CallbackResult, CompletedCallback,
    PendingCompletion, ResolveOutcome,
};
pub use interaction_history::{Interaction, InteractionHistory};
pub use provider_metrics::{CallStatus, MetricsSummary, ProviderMetricsRecord, ProviderMetricsRecorder};
pub use request_router::RequestRouter;
pub use response_cache::{CacheEntry, CacheError, ResponseCacheStore};
pub use webhook_event_store::{ProcessedWebhookStore, SaveResult};
