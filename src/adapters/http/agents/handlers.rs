//! HTTP handlers for the agent endpoints.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use crate::domain::batch::AgentInvocation;
use crate::domain::foundation::UserId;
use crate::domain::orchestration::AgentOperation;
use crate::ports::AgentExecutor;

use super::dto::{RunAgentRequest, RunAgentResponse};
use crate::adapters::http::error::ApiError;

/// Shared state for the agent routes.
#[derive(Clone)]
pub struct AgentsAppState {
    pub executor: Arc<dyn AgentExecutor>,
}

/// POST /api/agents/:operation - Run one agent operation synchronously
pub async fn run_agent(
    State(state): State<AgentsAppState>,
    Path(operation): Path<String>,
    Json(request): Json<RunAgentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let operation: AgentOperation = operation.parse()?;
    let invocation = AgentInvocation {
        operation,
        user_id: UserId::new(request.user_id)?,
        input: request.input,
        context: request.context,
        priority: request.priority,
    };

    let execution = state.executor.execute(invocation).await?;

    Ok(Json(RunAgentResponse::new(operation, execution)))
}
