//! AI Provider Port - One upstream language-model backend.
//!
//! The provider router only sees this trait. A backend either answers inline
//! (`complete`) or accepts the job and reports back later through a signed
//! webhook keyed by `metadata.request_id` (`submit`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RequestId, UserId};
use crate::domain::orchestration::AgentType;

pub use crate::domain::orchestration::{AIError, TokenUsage};

#[async_trait]
pub trait AIProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError>;

    /// Hand the request to the provider for asynchronous completion.
    ///
    /// The provider later reports the result through a webhook carrying
    /// `request.metadata.request_id`. Only providers whose
    /// [`completion_mode`](Self::completion_mode) is `Asynchronous` support this.
    async fn submit(&self, request: CompletionRequest) -> Result<SubmittedJob, AIError> {
        let _ = request;
        Err(AIError::InvalidRequest(format!(
            "{} does not support asynchronous completion",
            self.provider_info().name
        )))
    }

    /// How this provider delivers results.
    fn completion_mode(&self) -> CompletionMode {
        CompletionMode::Synchronous
    }

    /// Rough token count for `text` (about four characters per token).
    fn estimate_tokens(&self, text: &str) -> u32;

    fn provider_info(&self) -> ProviderInfo;
}

/// Delivery mode of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    #[default]
    Synchronous,
    /// Results arrive via webhook; the caller parks on a pending callback.
    Asynchronous,
}

/// Acknowledgement of an asynchronous submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    /// Provider-side job identifier, for logs.
    pub provider_job_id: String,
}

/// Prompt plus sampling settings for one agent request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            metadata,
        }
    }

    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Who and what a completion is for. Never sent to the model.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub user_id: UserId,
    /// Echoed back by asynchronous completions so the webhook can settle the caller.
    pub request_id: RequestId,
    pub agent_type: AgentType,
}

impl RequestMetadata {
    pub fn new(user_id: UserId, request_id: RequestId, agent_type: AgentType) -> Self {
        Self {
            user_id,
            request_id,
            agent_type,
        }
    }
}

/// Raw model output. Parsing and validation happen in the agent pipeline.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    /// Truncated at `max_tokens`; the JSON is usually incomplete.
    Length,
    ContentFilter,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Backend name used in metrics and logs ("openai", "anthropic").
    pub name: String,
    pub model: String,
    pub max_context_tokens: u32,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>, max_context_tokens: u32) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            max_context_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_metadata() -> RequestMetadata {
        RequestMetadata::new(
            UserId::new("test-user").unwrap(),
            RequestId::new(),
            AgentType::DailyInsight,
        )
    }

    struct SyncOnly;

    #[async_trait]
    impl AIProvider for SyncOnly {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, AIError> {
            Ok(CompletionResponse {
                content: "{}".to_string(),
                usage: TokenUsage::zero(),
                model: "sync".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }

        fn estimate_tokens(&self, text: &str) -> u32 {
            text.len() as u32 / 4
        }

        fn provider_info(&self) -> ProviderInfo {
            ProviderInfo::new("sync-only", "sync", 1000)
        }
    }

    #[test]
    fn builder_keeps_metadata_out_of_messages() {
        let metadata = test_metadata();
        let request_id = metadata.request_id;
        let request = CompletionRequest::new(metadata)
            .with_system_prompt("You are a relationship coach")
            .with_message(MessageRole::User, "Week 3 check-in")
            .with_max_tokens(800)
            .with_temperature(0.4);

        assert_eq!(request.messages, vec![Message {
            role: MessageRole::User,
            content: "Week 3 check-in".to_string(),
        }]);
        assert_eq!(request.metadata.request_id, request_id);
        assert_eq!(request.max_tokens, Some(800));
        assert_eq!(request.temperature, Some(0.4));
    }

    #[tokio::test]
    async fn submit_defaults_to_unsupported() {
        let provider = SyncOnly;
        assert_eq!(provider.completion_mode(), CompletionMode::Synchronous);
        let err = provider
            .submit(CompletionRequest::new(test_metadata()))
            .await
            .unwrap_err();
        assert!(matches!(err, AIError::InvalidRequest(msg) if msg.contains("sync-only")));
    }

    #[test]
    fn finish_reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&FinishReason::ContentFilter).unwrap(),
            "\"content_filter\""
        );
    }
}
