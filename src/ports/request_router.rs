//! RequestRouter port - Sends one agent request to an upstream provider.

use async_trait::async_trait;

use crate::domain::orchestration::{AIError, AgentRequest, AgentResponse, Prompt};

/// Port implemented by the provider router.
///
/// Backend selection, failover, per-call timeout and metrics are the
/// implementation's concern; callers see one response or one error.
#[async_trait]
pub trait RequestRouter: Send + Sync {
    async fn invoke(&self, request: &AgentRequest, prompt: &Prompt) -> Result<AgentResponse, AIError>;
}
