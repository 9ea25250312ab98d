//! Pipeline wiring over in-memory adapters for handler tests.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::ai::{InMemoryProviderMetrics, MockAIProvider, ProviderRouter};
use crate::adapters::cache::InMemoryResponseCache;
use crate::adapters::callbacks::InMemoryCallbackRegistry;
use crate::adapters::history::InMemoryInteractionHistory;
use crate::application::{SemanticCache, DEFAULT_CACHE_TTL};
use crate::domain::foundation::UserId;

use super::AgentPipeline;

pub struct Harness {
    pub provider: MockAIProvider,
    pub metrics: Arc<InMemoryProviderMetrics>,
    pub cache: Arc<SemanticCache>,
    pub history: Arc<InMemoryInteractionHistory>,
    pub pipeline: Arc<AgentPipeline>,
}

pub fn harness(provider: MockAIProvider) -> Harness {
    harness_with_timeout(provider, Duration::from_secs(30))
}

pub fn harness_with_timeout(provider: MockAIProvider, call_timeout: Duration) -> Harness {
    let metrics = Arc::new(InMemoryProviderMetrics::new());
    let router = ProviderRouter::new(metrics.clone(), Arc::new(InMemoryCallbackRegistry::new()))
        .with_backend("mock", Arc::new(provider.clone()))
        .with_call_timeout(call_timeout);
    let cache = Arc::new(SemanticCache::new(
        Arc::new(InMemoryResponseCache::default()),
        DEFAULT_CACHE_TTL,
    ));
    let history = Arc::new(InMemoryInteractionHistory::new(10));
    let pipeline = AgentPipeline::new(Arc::new(router), cache.clone(), history.clone())
        .with_retry_backoff(Duration::ZERO);

    Harness {
        provider,
        metrics,
        cache,
        history,
        pipeline: Arc::new(pipeline),
    }
}

pub fn user() -> UserId {
    UserId::new("user-42").unwrap()
}
