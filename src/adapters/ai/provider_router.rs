//! Provider Router - Backend selection, failover, timeouts and metrics.
//!
//! The router owns a set of named [`AIProvider`] backends and a route table:
//! an ordered backend list per agent type, a default list, and an optional
//! list reserved for high-priority requests. Each request walks its list in
//! order. A retryable failure (rate limit, 5xx, network) moves on to the next
//! backend and is logged as a provider fallback; any other failure, or the
//! end of the list, is returned to the caller.
//!
//! Backends in asynchronous mode are driven through the callback registry:
//! the router parks on a pending completion, submits the job, and waits for
//! the webhook receiver to settle it.
//!
//! # Example
//!
//! ```ignore
//! let router = ProviderRouter::new(metrics, callbacks)
//!     .with_backend("openai", Arc::new(openai))
//!     .with_backend("anthropic", Arc::new(anthropic))
//!     .with_agent_route(AgentType::LearningPath, ["anthropic", "openai"])
//!     .with_call_timeout(Duration::from_secs(30));
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::domain::orchestration::{AgentRequest, AgentResponse, AgentType, Priority, Prompt};
use crate::ports::{
    AIError, AIProvider, CallStatus, CallbackRegistry, CompletionMode, CompletionRequest,
    CompletionResponse, FinishReason, MessageRole, ProviderMetricsRecord, ProviderMetricsRecorder,
    RequestMetadata, RequestRouter,
};

/// Default bound on one synchronous provider call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default lifetime of a pending asynchronous completion.
pub const DEFAULT_CALLBACK_TTL: Duration = Duration::from_secs(60 * 60);

/// Routes agent requests to upstream providers.
pub struct ProviderRouter {
    backends: HashMap<String, Arc<dyn AIProvider>>,
    default_route: Vec<String>,
    agent_routes: HashMap<AgentType, Vec<String>>,
    high_priority_route: Vec<String>,
    call_timeout: Duration,
    callback_ttl: Duration,
    metrics: Arc<dyn ProviderMetricsRecorder>,
    callbacks: Arc<dyn CallbackRegistry>,
}

impl ProviderRouter {
    pub fn new(
        metrics: Arc<dyn ProviderMetricsRecorder>,
        callbacks: Arc<dyn CallbackRegistry>,
    ) -> Self {
        Self {
            backends: HashMap::new(),
            default_route: Vec::new(),
            agent_routes: HashMap::new(),
            high_priority_route: Vec::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            callback_ttl: DEFAULT_CALLBACK_TTL,
            metrics,
            callbacks,
        }
    }

    /// Registers a backend and appends it to the default route.
    pub fn with_backend(mut self, name: impl Into<String>, backend: Arc<dyn AIProvider>) -> Self {
        let name = name.into();
        if !self.default_route.contains(&name) {
            self.default_route.push(name.clone());
        }
        self.backends.insert(name, backend);
        self
    }

    /// Replaces the default route.
    pub fn with_default_route<I, S>(mut self, route: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_route = route.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the route for one agent type.
    pub fn with_agent_route<I, S>(mut self, agent_type: AgentType, route: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agent_routes
            .insert(agent_type, route.into_iter().map(Into::into).collect());
        self
    }

    /// Route used by high-priority requests, ahead of any per-agent route.
    pub fn with_high_priority_route<I, S>(mut self, route: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.high_priority_route = route.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_callback_ttl(mut self, callback_ttl: Duration) -> Self {
        self.callback_ttl = callback_ttl;
        self
    }

    /// Names of registered backends that the request may use, in order.
    pub fn route_for(&self, request: &AgentRequest) -> Vec<&str> {
        let route = if request.priority() == Priority::High && !self.high_priority_route.is_empty() {
            &self.high_priority_route
        } else {
            self.agent_routes
                .get(&request.agent_type())
                .unwrap_or(&self.default_route)
        };

        route
            .iter()
            .map(String::as_str)
            .filter(|name| {
                let known = self.backends.contains_key(*name);
                if !known {
                    tracing::warn!(provider = %name, "Route names an unregistered backend");
                }
                known
            })
            .collect()
    }

    fn completion_request(request: &AgentRequest, prompt: &Prompt) -> CompletionRequest {
        let metadata = RequestMetadata::new(
            request.user_id().clone(),
            request.id(),
            request.agent_type(),
        );

        let mut completion = CompletionRequest::new(metadata)
            .with_system_prompt(prompt.system.clone())
            .with_message(MessageRole::User, prompt.user.clone());
        if let Some(max_tokens) = request.max_tokens() {
            completion = completion.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = request.temperature() {
            completion = completion.with_temperature(temperature);
        }
        completion
    }

    async fn call_backend(
        &self,
        name: &str,
        backend: &dyn AIProvider,
        completion: CompletionRequest,
    ) -> Result<CompletionResponse, AIError> {
        let request_id = completion.metadata.request_id;
        let mode = backend.completion_mode();
        let started = Instant::now();

        let result = match mode {
            CompletionMode::Synchronous => {
                match timeout(self.call_timeout, backend.complete(completion)).await {
                    Ok(result) => result,
                    Err(_) => Err(AIError::timeout(self.call_timeout)),
                }
            }
            CompletionMode::Asynchronous => self.complete_via_callback(backend, completion).await,
        };

        // Webhook deliveries record their own metrics
        let recorded_by_webhook = mode == CompletionMode::Asynchronous
            && matches!(result, Ok(_) | Err(AIError::CallbackRejected(_)));
        if !recorded_by_webhook {
            let status = match &result {
                Ok(_) => CallStatus::Success,
                Err(err) if err.is_timeout() => CallStatus::Timeout,
                Err(_) => CallStatus::Failure,
            };
            let mut record = ProviderMetricsRecord::new(name, Some(request_id), status)
                .with_latency(started.elapsed());
            if let Ok(response) = &result {
                record = record.with_usage(response.usage.clone());
            }
            self.metrics.record(record).await;
        }

        result
    }

    async fn complete_via_callback(
        &self,
        backend: &dyn AIProvider,
        completion: CompletionRequest,
    ) -> Result<CompletionResponse, AIError> {
        let request_id = completion.metadata.request_id;
        let pending = self
            .callbacks
            .register(request_id, self.callback_ttl)
            .await
            .map_err(|e| AIError::InvalidRequest(e.to_string()))?;

        match backend.submit(completion).await {
            Ok(job) => tracing::info!(
                request_id = %request_id,
                provider_job_id = %job.provider_job_id,
                expires_at = %pending.expires_at.as_datetime(),
                "Submitted for asynchronous completion"
            ),
            Err(err) => {
                self.callbacks.cancel(request_id).await;
                return Err(err);
            }
        }

        let completed = match timeout(self.callback_ttl, pending.wait()).await {
            Ok(result) => result?,
            Err(_) => {
                self.callbacks.cancel(request_id).await;
                return Err(AIError::CallbackExpired);
            }
        };

        Ok(CompletionResponse {
            content: completed.content,
            usage: completed.usage,
            model: completed.model,
            finish_reason: FinishReason::Stop,
        })
    }
}

#[async_trait]
impl RequestRouter for ProviderRouter {
    async fn invoke(&self, request: &AgentRequest, prompt: &Prompt) -> Result<AgentResponse, AIError> {
        let route = self.route_for(request);
        if route.is_empty() {
            return Err(AIError::unavailable(format!(
                "no provider configured for {}",
                request.agent_type()
            )));
        }

        let completion = Self::completion_request(request, prompt);
        let mut last_error = None;

        for (position, name) in route.iter().enumerate() {
            let Some(backend) = self.backends.get(*name) else {
                continue;
            };

            match self.call_backend(name, backend.as_ref(), completion.clone()).await {
                Ok(response) => {
                    let provider = backend.provider_info().name;
                    return Ok(AgentResponse::new(
                        request.id(),
                        response.content,
                        response.usage,
                        provider,
                        response.model,
                    ));
                }
                Err(err) => {
                    // A timed-out call is not repeated elsewhere; the caller falls back
                    let next = route.get(position + 1);
                    match next {
                        Some(next) if err.is_retryable() && !err.is_timeout() => {
                            tracing::warn!(
                                request_id = %request.id(),
                                agent_type = %request.agent_type(),
                                primary_provider = %name,
                                fallback_provider = %next,
                                reason = %err,
                                "ProviderFallback"
                            );
                            last_error = Some(err);
                        }
                        _ => return Err(err),
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AIError::unavailable("no provider responded")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{InMemoryProviderMetrics, MockAIProvider};
    use crate::adapters::callbacks::InMemoryCallbackRegistry;
    use crate::domain::foundation::UserId;
    use crate::domain::orchestration::AgentOperation;
    use crate::ports::{CompletedCallback, ProviderInfo, TokenUsage};
    use serde_json::json;

    struct Fixture {
        metrics: Arc<InMemoryProviderMetrics>,
        callbacks: Arc<InMemoryCallbackRegistry>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                metrics: Arc::new(InMemoryProviderMetrics::new()),
                callbacks: Arc::new(InMemoryCallbackRegistry::new()),
            }
        }

        fn router(&self) -> ProviderRouter {
            ProviderRouter::new(self.metrics.clone(), self.callbacks.clone())
        }
    }

    fn named(name: &str) -> MockAIProvider {
        MockAIProvider::new().with_provider_info(ProviderInfo::new(name, format!("{}-model", name), 1000))
    }

    fn request(operation: AgentOperation) -> AgentRequest {
        AgentRequest::new(UserId::new("user-1").unwrap(), operation, json!({"input": {}}))
    }

    fn prompt() -> Prompt {
        Prompt::new("system", "user")
    }

    #[tokio::test]
    async fn uses_first_backend_on_success() {
        let fx = Fixture::new();
        let primary = named("openai").with_response("{\"ok\":true}");
        let secondary = named("anthropic");
        let router = fx
            .router()
            .with_backend("openai", Arc::new(primary.clone()))
            .with_backend("anthropic", Arc::new(secondary.clone()));

        let req = request(AgentOperation::GenerateDailyInsight);
        let response = router.invoke(&req, &prompt()).await.unwrap();

        assert_eq!(response.request_id, req.id());
        assert_eq!(response.provider, "openai");
        assert_eq!(response.content, "{\"ok\":true}");
        assert!(!response.cache_hit);
        assert_eq!(secondary.call_count(), 0);
        assert_eq!(fx.metrics.records()[0].status, CallStatus::Success);
    }

    #[tokio::test]
    async fn prompt_and_overrides_reach_backend() {
        let fx = Fixture::new();
        let backend = named("openai");
        let router = fx.router().with_backend("openai", Arc::new(backend.clone()));

        let req = request(AgentOperation::AnalyzeProgress)
            .with_max_tokens(256)
            .with_temperature(0.2);
        router.invoke(&req, &prompt()).await.unwrap();

        let call = &backend.get_calls()[0];
        assert_eq!(call.system_prompt.as_deref(), Some("system"));
        assert_eq!(call.messages[0].content, "user");
        assert_eq!(call.max_tokens, Some(256));
        assert_eq!(call.metadata.request_id, req.id());
    }

    #[tokio::test]
    async fn fails_over_on_retryable_error() {
        let fx = Fixture::new();
        let primary = named("openai").with_error(AIError::rate_limited(30));
        let secondary = named("anthropic").with_response("{}");
        let router = fx
            .router()
            .with_backend("openai", Arc::new(primary))
            .with_backend("anthropic", Arc::new(secondary));

        let response = router
            .invoke(&request(AgentOperation::AnalyzeAssessment), &prompt())
            .await
            .unwrap();

        assert_eq!(response.provider, "anthropic");
        let statuses: Vec<_> = fx.metrics.records().iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![CallStatus::Failure, CallStatus::Success]);
    }

    #[tokio::test]
    async fn does_not_fail_over_on_permanent_error() {
        let fx = Fixture::new();
        let secondary = named("anthropic");
        let router = fx
            .router()
            .with_backend("openai", Arc::new(named("openai").with_error(AIError::AuthenticationFailed)))
            .with_backend("anthropic", Arc::new(secondary.clone()));

        let err = router
            .invoke(&request(AgentOperation::AnalyzeAssessment), &prompt())
            .await
            .unwrap_err();

        assert_eq!(err, AIError::AuthenticationFailed);
        assert_eq!(secondary.call_count(), 0);
    }

    #[tokio::test]
    async fn last_error_returned_when_route_exhausted() {
        let fx = Fixture::new();
        let router = fx
            .router()
            .with_backend("openai", Arc::new(named("openai").with_error(AIError::unavailable("a"))))
            .with_backend("anthropic", Arc::new(named("anthropic").with_error(AIError::network("b"))));

        let err = router
            .invoke(&request(AgentOperation::AnalyzeAssessment), &prompt())
            .await
            .unwrap_err();
        assert_eq!(err, AIError::network("b"));
    }

    #[tokio::test]
    async fn agent_route_overrides_default() {
        let fx = Fixture::new();
        let router = fx
            .router()
            .with_backend("openai", Arc::new(named("openai")))
            .with_backend("anthropic", Arc::new(named("anthropic")))
            .with_agent_route(AgentType::LearningPath, ["anthropic"]);

        let response = router
            .invoke(&request(AgentOperation::GenerateLearningPath), &prompt())
            .await
            .unwrap();
        assert_eq!(response.provider, "anthropic");

        let response = router
            .invoke(&request(AgentOperation::GenerateDailyInsight), &prompt())
            .await
            .unwrap();
        assert_eq!(response.provider, "openai");
    }

    #[tokio::test]
    async fn high_priority_uses_dedicated_route() {
        let fx = Fixture::new();
        let router = fx
            .router()
            .with_backend("openai", Arc::new(named("openai")))
            .with_backend("premium", Arc::new(named("premium")))
            .with_default_route(["openai"])
            .with_high_priority_route(["premium"]);

        let req = request(AgentOperation::ResolveConflict).with_priority(Priority::High);
        assert_eq!(router.route_for(&req), vec!["premium"]);
        let req = request(AgentOperation::ResolveConflict);
        assert_eq!(router.route_for(&req), vec!["openai"]);
    }

    #[tokio::test]
    async fn unknown_backends_are_skipped_and_empty_route_is_unavailable() {
        let fx = Fixture::new();
        let router = fx.router().with_default_route(["ghost"]);

        let err = router
            .invoke(&request(AgentOperation::AnalyzeProgress), &prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, AIError::Unavailable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_without_failover() {
        let fx = Fixture::new();
        let secondary = named("anthropic");
        let router = fx
            .router()
            .with_backend("openai", Arc::new(named("openai").with_delay(Duration::from_secs(60))))
            .with_backend("anthropic", Arc::new(secondary.clone()))
            .with_call_timeout(Duration::from_secs(5));

        let err = router
            .invoke(&request(AgentOperation::AnalyzeAssessment), &prompt())
            .await
            .unwrap_err();

        assert_eq!(err, AIError::Timeout { timeout_secs: 5 });
        assert_eq!(secondary.call_count(), 0);
        assert_eq!(fx.metrics.records()[0].status, CallStatus::Timeout);
    }

    #[tokio::test]
    async fn async_backend_waits_for_callback() {
        let fx = Fixture::new();
        let backend = named("openai").with_async_completion();
        let router = Arc::new(fx.router().with_backend("openai", Arc::new(backend.clone())));

        let req = request(AgentOperation::GenerateDailyInsight);
        let request_id = req.id();
        let task = {
            let router = router.clone();
            tokio::spawn(async move { router.invoke(&req, &prompt()).await })
        };

        // Wait for the router to park on the callback
        while fx.callbacks.pending_count().await == 0 {
            tokio::task::yield_now().await;
        }
        let outcome = fx
            .callbacks
            .resolve(
                request_id,
                Ok(CompletedCallback {
                    content: "{\"title\":\"x\"}".to_string(),
                    model: "gpt-4o".to_string(),
                    usage: TokenUsage::new(5, 5, 0),
                }),
            )
            .await;
        assert!(matches!(outcome, crate::ports::ResolveOutcome::Resolved { .. }));

        let response = task.await.unwrap().unwrap();
        assert_eq!(response.content, "{\"title\":\"x\"}");
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(backend.call_count(), 1);
        assert!(fx.metrics.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn async_backend_expires_without_callback() {
        let fx = Fixture::new();
        let router = fx
            .router()
            .with_backend("openai", Arc::new(named("openai").with_async_completion()))
            .with_callback_ttl(Duration::from_secs(60));

        let err = router
            .invoke(&request(AgentOperation::GenerateDailyInsight), &prompt())
            .await
            .unwrap_err();

        assert_eq!(err, AIError::CallbackExpired);
        assert_eq!(fx.callbacks.pending_count().await, 0);
        assert_eq!(fx.metrics.records()[0].status, CallStatus::Timeout);
    }

    #[tokio::test]
    async fn rejected_submission_clears_pending_entry() {
        let fx = Fixture::new();
        let router = fx.router().with_backend(
            "openai",
            Arc::new(
                named("openai")
                    .with_async_completion()
                    .with_error(AIError::AuthenticationFailed),
            ),
        );

        let err = router
            .invoke(&request(AgentOperation::GenerateDailyInsight), &prompt())
            .await
            .unwrap_err();

        assert_eq!(err, AIError::AuthenticationFailed);
        assert_eq!(fx.callbacks.pending_count().await, 0);
    }
}
