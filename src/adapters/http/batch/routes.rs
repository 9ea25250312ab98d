//! Axum router for the batch endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    batch_stats, cancel_batch, get_batch, schedule_batch, submit_batch, BatchAppState,
};

/// Batch routes, mounted under `/api`.
///
/// # Routes
/// - `POST /batch` - submit up to the member limit, answered with 202
/// - `GET /batch/:batch_id` - progress and, once terminal, results
/// - `POST /batch/:batch_id/cancel` - cancel (409 once terminal)
/// - `POST /batch/schedule` - queue members by `scheduled_at`
/// - `GET /batch/stats` - counts by state
pub fn batch_router() -> Router<BatchAppState> {
    Router::new()
        .route("/batch", post(submit_batch))
        .route("/batch/stats", get(batch_stats))
        .route("/batch/schedule", post(schedule_batch))
        .route("/batch/:batch_id", get(get_batch))
        .route("/batch/:batch_id/cancel", post(cancel_batch))
}
