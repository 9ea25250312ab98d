//! Component wiring shared by the binary and the integration tests.
//!
//! [`AppBuilder`] turns an [`AppConfig`] into the HTTP state and the
//! maintenance worker. Backends and the cache store can be injected; when
//! they are not, they are built from configuration.

use std::sync::Arc;

use thiserror::Error;

use crate::adapters::ai::{
    AnthropicConfig, AnthropicProvider, InMemoryProviderMetrics, OpenAIConfig, OpenAIProvider,
    ProviderRouter,
};
use crate::adapters::batch::InMemoryBatchJobRepository;
use crate::adapters::cache::{InMemoryResponseCache, RedisResponseCache};
use crate::adapters::callbacks::{HttpCallbackNotifier, InMemoryCallbackRegistry};
use crate::adapters::history::InMemoryInteractionHistory;
use crate::adapters::http::{
    AgentsAppState, BatchAppState, BatchDefaults, HttpSettings, HttpState, WebhooksAppState,
};
use crate::adapters::webhook::InMemoryWebhookEventStore;
use crate::application::handlers::agents::{AgentDispatcher, AgentPipeline};
use crate::application::handlers::batch::{BatchOrchestrator, BatchScheduler};
use crate::application::handlers::webhook::{HandleProviderWebhookHandler, RegisterCallbackHandler};
use crate::application::{MaintenanceConfig, MaintenanceWorker, SemanticCache};
use crate::config::{AiProvider, AppConfig, CacheBackend};
use crate::domain::orchestration::AIError;
use crate::domain::webhook::WebhookProvider;
use crate::ports::{
    AIProvider, CacheError, CallbackError, CallbackRegistry, ProcessedWebhookStore,
    ProviderMetricsRecorder, ResponseCacheStore,
};

/// Failures while assembling components.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("AI provider setup failed: {0}")]
    Provider(#[from] AIError),

    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheError),

    #[error("callback notifier setup failed: {0}")]
    Callback(#[from] CallbackError),
}

/// Everything the process runs.
pub struct App {
    pub state: HttpState,
    pub settings: HttpSettings,
    pub maintenance: MaintenanceWorker,
    pub metrics: Arc<InMemoryProviderMetrics>,
}

pub struct AppBuilder {
    config: AppConfig,
    backends: Vec<(String, Arc<dyn AIProvider>)>,
    cache_store: Option<Arc<dyn ResponseCacheStore>>,
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            backends: Vec::new(),
            cache_store: None,
        }
    }

    /// Registers a backend instead of building providers from configuration.
    pub fn with_backend(mut self, name: impl Into<String>, backend: Arc<dyn AIProvider>) -> Self {
        self.backends.push((name.into(), backend));
        self
    }

    pub fn with_cache_store(mut self, store: Arc<dyn ResponseCacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    pub async fn build(self) -> Result<App, StartupError> {
        let config = self.config;

        // 1. Shared stores
        let metrics = Arc::new(InMemoryProviderMetrics::new());
        let callbacks: Arc<dyn CallbackRegistry> = Arc::new(InMemoryCallbackRegistry::new());
        let webhook_store: Arc<dyn ProcessedWebhookStore> = Arc::new(InMemoryWebhookEventStore::new());
        let history = Arc::new(InMemoryInteractionHistory::new(config.history.max_interactions));

        let cache_store = match self.cache_store {
            Some(store) => store,
            None => build_cache_store(&config).await?,
        };
        let cache = Arc::new(SemanticCache::new(cache_store, config.cache.ttl()));

        // 2. Provider router
        let metrics_recorder: Arc<dyn ProviderMetricsRecorder> = metrics.clone();
        let mut router = ProviderRouter::new(metrics_recorder.clone(), callbacks.clone())
            .with_call_timeout(config.ai.timeout())
            .with_callback_ttl(config.ai.callback_ttl());

        if self.backends.is_empty() {
            for provider in config.ai.route() {
                router = router.with_backend(provider.as_str(), build_provider(&config, provider)?);
            }
        } else {
            for (name, backend) in self.backends {
                router = router.with_backend(name, backend);
            }
        }
        let router = Arc::new(router);

        // 3. Agents and batches
        let pipeline = Arc::new(AgentPipeline::new(router, cache.clone(), history.clone()));
        let dispatcher = Arc::new(AgentDispatcher::new(pipeline));

        let orchestrator = BatchOrchestrator::new(Arc::new(InMemoryBatchJobRepository::new()), dispatcher.clone())
            .with_max_members(config.batch.max_members);
        let scheduler = Arc::new(BatchScheduler::new(orchestrator.clone()));

        // 4. Webhooks
        let mut webhook_handler =
            HandleProviderWebhookHandler::new(webhook_store.clone(), callbacks.clone(), metrics_recorder);
        for provider in WebhookProvider::all() {
            if let Some(secret) = config.webhooks.secret(*provider) {
                webhook_handler = webhook_handler.with_secret(*provider, secret);
            }
        }
        if let Some(secret) = config.webhooks.secret(WebhookProvider::Custom) {
            let notifier = HttpCallbackNotifier::new(secret, config.webhooks.notify_timeout())?;
            webhook_handler = webhook_handler.with_notifier(Arc::new(notifier));
        }
        let register_handler = RegisterCallbackHandler::new(callbacks.clone())
            .with_default_expiration(config.ai.callback_expiration_minutes);

        // 5. Background work
        let maintenance = MaintenanceWorker::new(
            callbacks,
            cache,
            orchestrator.clone(),
            scheduler.clone(),
            webhook_store,
            history,
        )
        .with_config(
            MaintenanceConfig::default()
                .with_interval(config.webhooks.sweep_interval())
                .with_batch_retention(config.batch.retention())
                .with_webhook_retention(config.webhooks.retention())
                .with_history_idle(config.history.idle_retention()),
        );

        let state = HttpState {
            agents: AgentsAppState {
                executor: dispatcher,
            },
            batch: BatchAppState {
                orchestrator,
                scheduler,
                defaults: BatchDefaults {
                    concurrency: config.batch.default_concurrency,
                    timeout: config.batch.default_timeout(),
                },
            },
            webhooks: WebhooksAppState {
                webhook_handler: Arc::new(webhook_handler),
                register_handler: Arc::new(register_handler),
            },
        };

        let settings = HttpSettings {
            cors_origins: config.server.cors_origins_list(),
            request_timeout: Some(config.server.request_timeout()),
        };

        Ok(App {
            state,
            settings,
            maintenance,
            metrics,
        })
    }
}

async fn build_cache_store(config: &AppConfig) -> Result<Arc<dyn ResponseCacheStore>, CacheError> {
    match (config.cache.backend, config.cache.redis_url.as_deref()) {
        (CacheBackend::Redis, Some(url)) => {
            let store = RedisResponseCache::connect(url)
                .await?
                .with_key_prefix(config.cache.key_prefix.clone());
            tracing::info!("Using Redis response cache");
            Ok(Arc::new(store))
        }
        (CacheBackend::Redis, None) => Err(CacheError::Unavailable("cache.redis_url is not set".to_string())),
        (CacheBackend::Memory, _) => Ok(Arc::new(InMemoryResponseCache::new(config.cache.max_entries))),
    }
}

fn build_provider(config: &AppConfig, provider: AiProvider) -> Result<Arc<dyn AIProvider>, AIError> {
    use secrecy::ExposeSecret;

    let ai = &config.ai;
    let missing = || AIError::InvalidRequest(format!("no API key for {}", provider.as_str()));

    match provider {
        AiProvider::OpenAI => {
            let key = ai.openai_api_key.as_ref().ok_or_else(missing)?;
            let mut provider_config = OpenAIConfig::new(key.expose_secret().clone())
                .with_model(ai.openai_model.clone())
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries)
                .with_async_completion(ai.openai_async_completion);
            if let Some(url) = &ai.openai_base_url {
                provider_config = provider_config.with_base_url(url.clone());
            }
            Ok(Arc::new(OpenAIProvider::new(provider_config)?))
        }
        AiProvider::Anthropic => {
            let key = ai.anthropic_api_key.as_ref().ok_or_else(missing)?;
            let mut provider_config = AnthropicConfig::new(key.expose_secret().clone())
                .with_model(ai.anthropic_model.clone())
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries)
                .with_async_completion(ai.anthropic_async_completion);
            if let Some(url) = &ai.anthropic_base_url {
                provider_config = provider_config.with_base_url(url.clone());
            }
            Ok(Arc::new(AnthropicProvider::new(provider_config)?))
        }
    }
}
