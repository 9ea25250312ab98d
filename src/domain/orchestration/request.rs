//! The immutable agent request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{RequestId, Timestamp, UserId};

use super::{AgentOperation, AgentType, Fingerprint, Priority};

/// Maximum sampling temperature accepted by either provider.
const MAX_TEMPERATURE: f32 = 2.0;

/// A typed request for one agent operation.
///
/// Fields are private; once built, a request is only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    id: RequestId,
    user_id: UserId,
    agent_type: AgentType,
    operation: AgentOperation,
    payload: Value,
    priority: Priority,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    created_at: Timestamp,
}

impl AgentRequest {
    /// Creates a request. The agent type is derived from the operation.
    pub fn new(user_id: UserId, operation: AgentOperation, payload: Value) -> Self {
        Self {
            id: RequestId::new(),
            user_id,
            agent_type: operation.agent_type(),
            operation,
            payload,
            priority: Priority::default(),
            max_tokens: None,
            temperature: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Caps output size. Zero is raised to one token.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens.max(1));
        self
    }

    /// Sets the sampling temperature, clamped into [0, 2].
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        let temperature = if temperature.is_finite() {
            temperature.clamp(0.0, MAX_TEMPERATURE)
        } else {
            0.0
        };
        self.temperature = Some(temperature);
        self
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    pub fn operation(&self) -> AgentOperation {
        self.operation
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Cache key for this request. Ignores id, user and timestamps.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.agent_type, self.operation, &self.payload)
    }
}
