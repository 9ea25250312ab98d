//! AgentPipeline - The request lifecycle shared by every agent operation.
//!
//! `created -> cache-checked -> {cache-hit-returned | provider-invoked}
//! -> {validated-returned | fallback-returned}`
//!
//! Each operation contributes an [`OperationDefinition`]: its prompt builder,
//! output type and fallback. Provider errors never reach the caller; they are
//! classified, retried while the attempt budget remains, and otherwise
//! replaced by the operation's fallback output.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::application::SemanticCache;
use crate::domain::agents::{parse_output, AgentInput, OutputSchema};
use crate::domain::foundation::{RequestId, UserId};
use crate::domain::orchestration::{
    classify, AgentOperation, AgentRequest, AgentResponse, Classification, ErrorContext,
    OrchestratorError, OutcomeSource, Priority, Prompt, RecoveryAction, TokenUsage,
};
use crate::ports::{Interaction, InteractionHistory, RequestRouter};

/// Default number of provider attempts per request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default number of past interactions included as prompt context.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Static description of one agent operation.
pub struct OperationDefinition<I, O> {
    pub operation: AgentOperation,
    pub build_prompt: fn(&I, Option<&Value>, &[Interaction]) -> Prompt,
    pub fallback: fn(&I) -> O,
    /// One-line summary recorded in the interaction history.
    pub summarize: fn(&O) -> String,
}

/// Typed input for one agent operation.
#[derive(Debug, Clone)]
pub struct AgentCommand<I> {
    pub user_id: UserId,
    pub input: I,
    pub context: Option<Value>,
    pub priority: Priority,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl<I> AgentCommand<I> {
    pub fn new(user_id: UserId, input: I) -> Self {
        Self {
            user_id,
            input,
            context: None,
            priority: Priority::default(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A schema-valid output and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome<O> {
    pub request_id: RequestId,
    pub output: O,
    pub source: OutcomeSource,
    pub usage: TokenUsage,
}

impl<O> AgentOutcome<O> {
    pub fn is_fallback(&self) -> bool {
        self.source == OutcomeSource::Fallback
    }
}

/// Runs agent operations against the cache, router and history.
pub struct AgentPipeline {
    router: Arc<dyn RequestRouter>,
    cache: Arc<SemanticCache>,
    history: Arc<dyn InteractionHistory>,
    max_attempts: u32,
    history_limit: usize,
    retry_backoff: Duration,
}

impl AgentPipeline {
    pub fn new(
        router: Arc<dyn RequestRouter>,
        cache: Arc<SemanticCache>,
        history: Arc<dyn InteractionHistory>,
    ) -> Self {
        Self {
            router,
            cache,
            history,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Runs one operation to a schema-valid output.
    ///
    /// Returns `Err` only for invalid input or errors the classifier
    /// surfaces.
    pub async fn run<I, O>(
        &self,
        definition: &OperationDefinition<I, O>,
        cmd: AgentCommand<I>,
    ) -> Result<AgentOutcome<O>, OrchestratorError>
    where
        I: AgentInput,
        O: OutputSchema,
    {
        // 1. Reject invalid input before anything else
        cmd.input.validate()?;

        // 2. Build the immutable request
        let payload = request_payload(&cmd.input, cmd.context.as_ref())?;
        let mut request =
            AgentRequest::new(cmd.user_id.clone(), definition.operation, payload).with_priority(cmd.priority);
        if let Some(max_tokens) = cmd.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = cmd.temperature {
            request = request.with_temperature(temperature);
        }

        // 3. Serve a validated cache hit
        if let Some(hit) = self.cache.get(&request).await {
            match parse_output::<O>(&hit.content) {
                Ok(output) => {
                    self.remember(&request, definition, &output).await;
                    return Ok(AgentOutcome {
                        request_id: request.id(),
                        output,
                        source: OutcomeSource::Cache,
                        usage: TokenUsage::zero(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        request_id = %request.id(),
                        agent_type = %request.agent_type(),
                        error = %e,
                        "Cached payload failed validation, discarding"
                    );
                    self.cache.invalidate(&request).await;
                }
            }
        }

        // 4. Build the prompt with recent history as context
        let history = if self.history_limit == 0 {
            Vec::new()
        } else {
            self.history
                .recent(request.user_id(), definition.operation, self.history_limit)
                .await
        };
        let prompt = (definition.build_prompt)(&cmd.input, cmd.context.as_ref(), &history);

        // 5. Invoke the provider, retrying transient failures
        let response = match self.invoke(&request, &prompt).await {
            Ok(response) => response,
            Err(classification) => match classification.action {
                RecoveryAction::Fallback => {
                    return Ok(fallback(definition, &request, &cmd.input, TokenUsage::zero()))
                }
                _ => return Err(classification.error),
            },
        };

        // 6. Validate, then cache the raw response
        match parse_output::<O>(&response.content) {
            Ok(output) => {
                self.cache.set(&request, &response).await;
                self.remember(&request, definition, &output).await;

                tracing::info!(
                    request_id = %request.id(),
                    agent_type = %request.agent_type(),
                    operation = %definition.operation,
                    provider = %response.provider,
                    total_tokens = response.usage.total_tokens,
                    "Agent operation completed"
                );
                Ok(AgentOutcome {
                    request_id: request.id(),
                    output,
                    source: OutcomeSource::Provider,
                    usage: response.usage,
                })
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request.id(),
                    agent_type = %request.agent_type(),
                    provider = %response.provider,
                    error = %e,
                    "Provider output failed validation"
                );
                Ok(fallback(definition, &request, &cmd.input, response.usage))
            }
        }
    }

    async fn invoke(
        &self,
        request: &AgentRequest,
        prompt: &Prompt,
    ) -> Result<AgentResponse, Classification> {
        let mut attempt = 1;
        loop {
            let error = match self.router.invoke(request, prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            let context = ErrorContext::new(request.id())
                .with_agent_type(request.agent_type())
                .with_fallback(true)
                .with_attempt(attempt, self.max_attempts);
            let classification = classify(OrchestratorError::Provider(error), &context);

            if classification.action != RecoveryAction::Retry {
                return Err(classification);
            }

            attempt += 1;
            if !self.retry_backoff.is_zero() {
                tokio::time::sleep(self.retry_backoff * (attempt - 1)).await;
            }
        }
    }

    async fn remember<I, O>(&self, request: &AgentRequest, definition: &OperationDefinition<I, O>, output: &O) {
        let interaction = Interaction::new(request.id(), definition.operation, (definition.summarize)(output));
        self.history.record(request.user_id(), interaction).await;
    }
}

/// Payload hashed into the fingerprint: the input and the optional context.
/// History never enters the payload.
fn request_payload<I: AgentInput>(
    input: &I,
    context: Option<&Value>,
) -> Result<Value, OrchestratorError> {
    let input = serde_json::to_value(input)
        .map_err(|e| OrchestratorError::internal(format!("failed to encode input: {}", e)))?;

    let mut payload = Map::new();
    payload.insert("input".to_string(), input);
    if let Some(context) = context.filter(|c| !c.is_null()) {
        payload.insert("context".to_string(), context.clone());
    }
    Ok(Value::Object(payload))
}

fn fallback<I, O: OutputSchema>(
    definition: &OperationDefinition<I, O>,
    request: &AgentRequest,
    input: &I,
    usage: TokenUsage,
) -> AgentOutcome<O> {
    tracing::info!(
        request_id = %request.id(),
        agent_type = %request.agent_type(),
        operation = %definition.operation,
        "Returning fallback output"
    );
    AgentOutcome {
        request_id: request.id(),
        output: (definition.fallback)(input).normalized(),
        source: OutcomeSource::Fallback,
        usage,
    }
}
