//! OpenAI backend.
//!
//! Synchronous calls go to `/chat/completions`. With asynchronous completion
//! enabled, requests become background responses (`/responses`) and the
//! result comes back through the OpenAI webhook, matched on the request id
//! sent in `X-Callback-Request-Id` and in the response metadata.

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

/// Header carrying our request id on asynchronous submissions.
pub const CALLBACK_REQUEST_ID_HEADER: &str = "X-Callback-Request-Id";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    pub model: String,
    /// Overridable for proxies and tests.
    pub base_url: String,
    /// Per HTTP call, independent of the router's call timeout.
    pub timeout: Duration,
    /// Extra attempts after a retryable failure.
    pub max_retries: u32,
    pub async_completion: bool,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
            async_completion: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_async_completion(mut self, enabled: bool) -> Self {
        self.async_completion = enabled;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.config.base_url)
    }

    fn to_messages(request: &CompletionRequest) -> Vec<OpenAIMessage> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }
        messages
    }

    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.config.model.clone(),
            messages: Self::to_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
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

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&self.to_openai_request(request))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))
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
                if error_body.contains("maximum context length")
                    || error_body.contains("context_length_exceeded")
                {
                    Err(AIError::context_too_long(0, 0))
                } else {
                    Err(AIError::InvalidRequest(error_body))
                }
            }
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

    /// Parses retry-after from error response, defaulting to 30 seconds.
    fn parse_retry_after(error_body: &str) -> u32 {
        let message = serde_json::from_str::<serde_json::Value>(error_body)
            .ok()
            .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string));

        message
            .and_then(|s| {
                let idx = s.find("try again in ")?;
                let rest = &s[idx + 13..];
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u32>().ok()
            })
            .unwrap_or(30)
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = Self::handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => {
                return Err(AIError::content_filtered("response blocked by content filter"))
            }
            _ => FinishReason::Stop,
        };

        let usage = openai_response
            .usage
            .map(|u| {
                TokenUsage::new(
                    u.prompt_tokens,
                    u.completion_tokens,
                    self.calculate_cost(u.prompt_tokens, u.completion_tokens),
                )
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            usage,
            model: openai_response.model,
            finish_reason,
        })
    }

    /// Calculates estimated cost in cents based on model and token counts.
    fn calculate_cost(&self, prompt_tokens: u32, completion_tokens: u32) -> u32 {
        // Prices per 1M tokens (in cents)
        let (prompt_price, completion_price) = match self.config.model.as_str() {
            m if m.starts_with("gpt-4o-mini") => (15, 60),
            m if m.starts_with("gpt-4o") => (250, 1000),
            m if m.starts_with("gpt-4-turbo") => (1000, 3000),
            m if m.starts_with("gpt-4") => (3000, 6000),
            m if m.starts_with("gpt-3.5") => (50, 150),
            _ => (1000, 3000),
        };

        let prompt_cost = (prompt_tokens as u64 * prompt_price) / 1_000_000;
        let completion_cost = (completion_tokens as u64 * completion_price) / 1_000_000;

        (prompt_cost + completion_cost) as u32
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let request = &request;
        with_retries("openai", request.metadata.request_id, self.config.max_retries, move || async move {
            let response = self.send_request(request).await?;
            self.parse_response(response).await
        })
        .await
    }

    async fn submit(&self, request: CompletionRequest) -> Result<SubmittedJob, AIError> {
        let request_id = request.metadata.request_id.to_string();
        let body = BackgroundRequest {
            model: self.config.model.clone(),
            input: Self::to_messages(&request),
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
            background: true,
            metadata: BackgroundMetadata {
                request_id: request_id.clone(),
                agent_type: request.metadata.agent_type.as_str().to_string(),
            },
        };

        let response = self
            .client
            .post(self.responses_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header(CALLBACK_REQUEST_ID_HEADER, &request_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::handle_response_status(response).await?;

        let accepted: BackgroundAccepted = response
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
        // ~4 characters per token on average
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        let max_context = match self.config.model.as_str() {
            m if m.starts_with("gpt-4-turbo") || m.starts_with("gpt-4o") => 128_000,
            m if m.starts_with("gpt-4") => 8192,
            m if m.starts_with("gpt-3.5") => 16_385,
            _ => 128_000,
        };

        ProviderInfo::new("openai", &self.config.model, max_context)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct BackgroundRequest {
    model: String,
    input: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    background: bool,
    metadata: BackgroundMetadata,
}

#[derive(Debug, Serialize)]
struct BackgroundMetadata {
    request_id: String,
    agent_type: String,
}

#[derive(Debug, Deserialize)]
struct BackgroundAccepted {
    id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
