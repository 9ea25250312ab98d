//! Request and response bodies for the agent endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::batch::AgentExecution;
use crate::domain::foundation::RequestId;
use crate::domain::orchestration::{AgentOperation, AgentType, OutcomeSource, Priority, TokenUsage};

/// Body of `POST /api/agents/:operation`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunAgentRequest {
    pub user_id: String,
    pub input: Value,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunAgentResponse {
    pub request_id: RequestId,
    pub operation: AgentOperation,
    pub agent_type: AgentType,
    pub output: Value,
    pub source: OutcomeSource,
    pub usage: TokenUsage,
}

impl RunAgentResponse {
    pub fn new(operation: AgentOperation, execution: AgentExecution) -> Self {
        Self {
            request_id: execution.request_id,
            operation,
            agent_type: operation.agent_type(),
            output: execution.output,
            source: execution.source,
            usage: execution.usage,
        }
    }
}
