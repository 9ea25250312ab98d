//! Batch members and their resolution into agent invocations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{RequestId, Timestamp, UserId, ValidationError};
use crate::domain::orchestration::{AgentOperation, AgentType, OutcomeSource, Priority, TokenUsage};

/// One unit of work inside a batch, as submitted.
///
/// Agent type and operation arrive as free text and are only checked when the
/// member is dispatched, so one malformed member fails alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMember {
    pub agent_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    pub user_id: String,
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<Timestamp>,
}

impl BatchMember {
    pub fn new(agent_type: impl Into<String>, user_id: impl Into<String>, input: Value) -> Self {
        Self {
            agent_type: agent_type.into(),
            operation: None,
            user_id: user_id.into(),
            input,
            context: None,
            priority: Priority::default(),
            scheduled_at: None,
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn scheduled_for(mut self, at: Timestamp) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// Resolves the textual agent type and operation.
    ///
    /// Without an explicit operation the agent type's default is used. An
    /// operation belonging to another agent type is rejected.
    pub fn resolve(&self) -> Result<AgentInvocation, ValidationError> {
        let agent_type: AgentType = self.agent_type.trim().parse()?;
        let operation = match &self.operation {
            Some(op) => {
                let op: AgentOperation = op.trim().parse()?;
                if op.agent_type() != agent_type {
                    return Err(ValidationError::invalid_format(
                        "operation",
                        format!("'{}' does not belong to agent type '{}'", op, agent_type),
                    ));
                }
                op
            }
            None => agent_type.default_operation(),
        };

        Ok(AgentInvocation {
            operation,
            user_id: UserId::new(self.user_id.clone())?,
            input: self.input.clone(),
            context: self.context.clone(),
            priority: self.priority,
        })
    }
}

/// A resolved, dispatchable agent call.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentInvocation {
    pub operation: AgentOperation,
    pub user_id: UserId,
    pub input: Value,
    pub context: Option<Value>,
    pub priority: Priority,
}

/// Result of executing one invocation. Fallback outputs are successes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentExecution {
    pub request_id: RequestId,
    pub output: Value,
    pub source: OutcomeSource,
    pub usage: TokenUsage,
}
