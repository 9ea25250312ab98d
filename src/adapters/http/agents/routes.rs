//! Axum router for the agent endpoints.

use axum::{routing::post, Router};

use super::handlers::{run_agent, AgentsAppState};

/// Agent routes, mounted under `/api`.
///
/// - `POST /agents/:operation` - run one operation, e.g. `analyze_assessment`
pub fn agents_router() -> Router<AgentsAppState> {
    Router::new().route("/agents/:operation", post(run_agent))
}
