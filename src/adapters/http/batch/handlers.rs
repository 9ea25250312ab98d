//! HTTP handlers for the batch endpoints.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::batch::{BatchOrchestrator, BatchScheduler};
use crate::domain::foundation::{BatchId, ValidationError};

use super::dto::{BatchDefaults, BatchStatusResponse, SubmitBatchRequest, SubmitBatchResponse};
use crate::adapters::http::error::ApiError;

/// Shared state for the batch routes.
#[derive(Clone)]
pub struct BatchAppState {
    pub orchestrator: BatchOrchestrator,
    pub scheduler: Arc<BatchScheduler>,
    pub defaults: BatchDefaults,
}

fn parse_batch_id(raw: &str) -> Result<BatchId, ValidationError> {
    raw.parse()
        .map_err(|_| ValidationError::invalid_format("batch_id", "expected a UUID"))
}

/// POST /api/batch - Accept a batch for background processing
pub async fn submit_batch(
    State(state): State<BatchAppState>,
    Json(request): Json<SubmitBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let options = request.options.into_options(state.defaults);
    let batch_id = state.orchestrator.submit(request.members, options).await?;

    Ok((StatusCode::ACCEPTED, Json(SubmitBatchResponse::accepted(batch_id))))
}

/// GET /api/batch/:batch_id - Job progress, with results once terminal
pub async fn get_batch(
    State(state): State<BatchAppState>,
    Path(batch_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.orchestrator.status(parse_batch_id(&batch_id)?).await?;
    Ok(Json(BatchStatusResponse::from(&job)))
}

/// POST /api/batch/:batch_id/cancel - Cancel a running job
pub async fn cancel_batch(
    State(state): State<BatchAppState>,
    Path(batch_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.orchestrator.cancel(parse_batch_id(&batch_id)?).await?;
    Ok(Json(BatchStatusResponse::from(&job)))
}

/// POST /api/batch/schedule - Queue members until their scheduled time
pub async fn schedule_batch(
    State(state): State<BatchAppState>,
    Json(request): Json<SubmitBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let options = request.options.into_options(state.defaults);
    let receipt = state.scheduler.schedule(request.members, options).await?;

    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

/// GET /api/batch/stats - Job counts by state and queue length
pub async fn batch_stats(State(state): State<BatchAppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.scheduler.stats().await?))
}
