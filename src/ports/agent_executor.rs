//! AgentExecutor port - Runs one resolved agent invocation.
//!
//! The batch orchestrator depends on this port instead of the concrete
//! handlers, so batches can be tested with scripted executors.

use async_trait::async_trait;

use crate::domain::batch::{AgentExecution, AgentInvocation};
use crate::domain::orchestration::OrchestratorError;

#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Executes the invocation. Fallback outputs are `Ok`; only surfaced
    /// errors (invalid input, internal faults) are `Err`.
    async fn execute(&self, invocation: AgentInvocation) -> Result<AgentExecution, OrchestratorError>;
}
