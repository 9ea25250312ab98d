//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port for various LLM providers, plus
//! the router that chooses between them.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Configurable mock for testing
//! - `OpenAIProvider` - OpenAI GPT models
//! - `AnthropicProvider` - Anthropic Claude models
//! - `ProviderRouter` - Route table, failover, timeouts and async completion
//! - `InMemoryProviderMetrics` - Append-only call metrics

mod anthropic_provider;
mod in_memory_metrics;
mod mock_provider;
mod openai_provider;
mod provider_router;
mod retry;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use in_memory_metrics::InMemoryProviderMetrics;
pub use mock_provider::{MockAIProvider, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider, CALLBACK_REQUEST_ID_HEADER};
pub use provider_router::{ProviderRouter, DEFAULT_CALLBACK_TTL, DEFAULT_CALL_TIMEOUT};
