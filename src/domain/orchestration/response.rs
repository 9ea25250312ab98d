//! Provider responses and token accounting.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RequestId, Timestamp};

/// Token usage information for billing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
    /// Estimated cost in cents.
    pub estimated_cost_cents: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32, cost_cents: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            estimated_cost_cents: cost_cents,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Raw result of one provider call, produced exactly once per request.
///
/// A cache hit never mutates the stored response; it yields a fresh value
/// pointing at the new request with `cache_hit` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub request_id: RequestId,
    /// Provider output text, unparsed.
    pub content: String,
    pub usage: TokenUsage,
    pub provider: String,
    pub model: String,
    pub cache_hit: bool,
    pub completed_at: Timestamp,
}

impl AgentResponse {
    pub fn new(
        request_id: RequestId,
        content: impl Into<String>,
        usage: TokenUsage,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            content: content.into(),
            usage,
            provider: provider.into(),
            model: model.into(),
            cache_hit: false,
            completed_at: Timestamp::now(),
        }
    }

    /// Derives the response served to `request_id` from this cached one.
    pub fn served_from_cache(&self, request_id: RequestId) -> Self {
        Self {
            request_id,
            content: self.content.clone(),
            usage: TokenUsage::zero(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            cache_hit: true,
            completed_at: Timestamp::now(),
        }
    }
}

/// Where an agent output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    Cache,
    Provider,
    Fallback,
}
