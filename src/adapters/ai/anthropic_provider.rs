//! Anthropic Provider - Implementation of AIProvider for Anthropic's Claude API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let provider = AnthropicProvider::new(config)?;
//! ```
//!
//! Asynchronous completion submits a single-entry message batch whose
//! `custom_id` is our request id. The completion webhook echoes it back.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::retry::with_retries;
use crate::ports::{
    AIError, AIProvider, CompletionMode, CompletionRequest, CompletionResponse, FinishReason,
    MessageRole, ProviderInfo, SubmittedJob, TokenUsage,
};

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Submit requests as message batches completed via webhook.
    pub async_completion: bool,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
            async_completion: false,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_async_completion(mut self, enabled: bool) -> Self {
        self.async_completion = enabled;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Output cap when the request does not set one; the API requires a value.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic API provider implementation.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn batches_url(&self) -> String {
        format!("{}/v1/messages/batches", self.config.base_url)
    }

    /// Converts our request to Anthropic's format.
    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        // System prompt travels separately, never as a message
        let mut messages: Vec<AnthropicMessage> = request
            .messages
            .iter()
            .filter_map(|msg| {
                let role = match msg.role {
                    MessageRole::System => return None,
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                };
                Some(AnthropicMessage {
                    role: role.to_string(),
                    content: msg.content.clone(),
                })
            })
            .collect();

        if messages.is_empty() {
            messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: "Respond with the JSON object described above.".to_string(),
            });
        }

        AnthropicRequest {
            model: self.config.model.clone(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> AIError {
        if e.is_timeout() {
            AIError::timeout(self.config.timeout)
        } else if e.is_connect() {
            AIError::network(format!("Connection failed: {}", e))
        } else {
            AIError::network(e.to_string())
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, url: String, body: &T) -> Result<Response, AIError> {
        let response = self
            .client
            .post(url)
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Self::handle_response_status(response).await
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 => {
                if error_body.contains("prompt is too long") {
                    Err(AIError::context_too_long(0, 0))
                } else {
                    Err(AIError::InvalidRequest(error_body))
                }
            }
            // 529 is Anthropic's "overloaded"
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        let message = serde_json::from_str::<serde_json::Value>(error_body)
            .ok()
            .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string));

        message
            .and_then(|s| {
                let idx = s.find("try again in ")?;
                let digits: String = s[idx + 13..]
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse::<u32>().ok()
            })
            // Anthropic tends to have longer rate limit windows
            .unwrap_or(60)
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        let content = anthropic_response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let finish_reason = match anthropic_response.stop_reason.as_deref() {
            Some("max_tokens") => FinishReason::Length,
            Some("refusal") => return Err(AIError::content_filtered("model refused the request")),
            _ => FinishReason::Stop,
        };

        let usage = TokenUsage::new(
            anthropic_response.usage.input_tokens,
            anthropic_response.usage.output_tokens,
            self.calculate_cost(
                anthropic_response.usage.input_tokens,
                anthropic_response.usage.output_tokens,
            ),
        );

        Ok(CompletionResponse {
            content,
            usage,
            model: anthropic_response.model,
            finish_reason,
        })
    }

    /// Calculates estimated cost in cents based on model and token counts.
    fn calculate_cost(&self, input_tokens: u32, output_tokens: u32) -> u32 {
        // Prices per 1M tokens (in cents)
        let (input_price, output_price) = match self.config.model.as_str() {
            m if m.contains("opus") => (1500, 7500),
            m if m.contains("sonnet") => (300, 1500),
            m if m.contains("haiku") => (25, 125),
            _ => (300, 1500),
        };

        let input_cost = (input_tokens as u64 * input_price) / 1_000_000;
        let output_cost = (output_tokens as u64 * output_price) / 1_000_000;

        (input_cost + output_cost) as u32
    }
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let body = &self.to_anthropic_request(&request);
        let url = &self.messages_url();
        with_retries("anthropic", request.metadata.request_id, self.config.max_retries, move || async move {
            let response = self.post(url.clone(), body).await?;
            self.parse_response(response).await
        })
        .await
    }

    async fn submit(&self, request: CompletionRequest) -> Result<SubmittedJob, AIError> {
        let batch = BatchSubmission {
            requests: vec![BatchEntry {
                custom_id: request.metadata.request_id.to_string(),
                params: self.to_anthropic_request(&request),
            }],
        };

        let response = self.post(self.batches_url(), &batch).await?;
        let accepted: BatchAccepted = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse submission: {}", e)))?;

        Ok(SubmittedJob {
            provider_job_id: accepted.id,
        })
    }

    fn completion_mode(&self) -> CompletionMode {
        if self.config.async_completion {
            CompletionMode::Asynchronous
        } else {
            CompletionMode::Synchronous
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // Claude uses ~3.5 characters per token on average
        ((text.len() as f64 / 3.5).ceil() as u32).max(1)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", &self.config.model, 200_000)
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct BatchSubmission {
    requests: Vec<BatchEntry>,
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    custom_id: String,
    params: AnthropicRequest,
}

#[derive(Debug, Deserialize)]
struct BatchAccepted {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{RequestId, UserId};
    use crate::domain::orchestration::AgentType;
    use crate::ports::RequestMetadata;

    fn provider(model: &str) -> AnthropicProvider {
        AnthropicProvider::new(AnthropicConfig::new("test").with_model(model)).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(
            UserId::new("u").unwrap(),
            RequestId::new(),
            AgentType::LearningPath,
        ))
    }

    #[test]
    fn config_builder_works() {
        let config = AnthropicConfig::new("test-key")
            .with_model("claude-3-opus-20240229")
            .with_timeout(Duration::from_secs(120))
            .with_max_retries(5);

        assert_eq!(config.model, "claude-3-opus-20240229");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.max_retries, 5);
        assert!(!config.async_completion);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn cost_calculation_opus() {
        // 1000 input = 1.5 cents, 500 output = 3.75 cents; each part truncates
        assert_eq!(provider("claude-3-opus-20240229").calculate_cost(1000, 500), 4);
        assert_eq!(provider("claude-3-opus-20240229").calculate_cost(1_000_000, 0), 1500);
    }

    #[test]
    fn cost_calculation_haiku() {
        assert_eq!(provider("claude-3-haiku-20240307").calculate_cost(1_000_000, 1_000_000), 150);
    }

    #[test]
    fn system_prompt_is_not_a_message() {
        let req = request()
            .with_system_prompt("You are a coach")
            .with_message(MessageRole::User, "Plan my week");
        let body = provider("claude-sonnet-4-20250514").to_anthropic_request(&req);

        assert_eq!(body.system.as_deref(), Some("You are a coach"));
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn empty_conversation_gets_placeholder_user_turn() {
        let body = provider("claude-sonnet-4-20250514")
            .to_anthropic_request(&request().with_system_prompt("only system"));
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[test]
    fn provider_info_reports_context() {
        let info = provider("claude-3-haiku-20240307").provider_info();
        assert_eq!(info.name, "anthropic");
        assert_eq!(info.max_context_tokens, 200_000);
    }

    #[test]
    fn estimate_tokens_approximates() {
        let p = provider("claude-sonnet-4-20250514");
        assert_eq!(p.estimate_tokens(""), 1);
        assert_eq!(p.estimate_tokens("1234567"), 2);
    }

    #[test]
    fn parse_retry_after_default() {
        assert_eq!(AnthropicProvider::parse_retry_after("not json"), 60);
        let body = r#"{"error":{"message":"Please try again in 7 seconds"}}"#;
        assert_eq!(AnthropicProvider::parse_retry_after(body), 7);
    }
}
