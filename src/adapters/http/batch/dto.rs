//! Request and response bodies for the batch endpoints.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::batch::{BatchJob, BatchMember, BatchOptions, BatchStatus, MemberResult};
use crate::domain::foundation::{BatchId, Timestamp};

/// Batch options as sent by callers. Absent fields take server defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchOptionsRequest {
    pub parallel: Option<bool>,
    pub max_concurrency: Option<usize>,
    pub fail_fast: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// Server-side defaults applied to [`BatchOptionsRequest`].
#[derive(Debug, Clone, Copy)]
pub struct BatchDefaults {
    pub concurrency: usize,
    pub timeout: Option<Duration>,
}

impl Default for BatchDefaults {
    fn default() -> Self {
        Self {
            concurrency: crate::domain::batch::DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }
}

impl BatchOptionsRequest {
    pub fn into_options(self, defaults: BatchDefaults) -> BatchOptions {
        let mut options = BatchOptions::new()
            .with_max_concurrency(self.max_concurrency.unwrap_or(defaults.concurrency))
            .with_fail_fast(self.fail_fast.unwrap_or(false));
        if !self.parallel.unwrap_or(true) {
            options = options.sequential();
        }
        if let Some(timeout) = self.timeout_secs.map(Duration::from_secs).or(defaults.timeout) {
            options = options.with_timeout(timeout);
        }
        options
    }
}

/// Body of `POST /api/batch` and `POST /api/batch/schedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBatchRequest {
    pub members: Vec<BatchMember>,
    #[serde(default)]
    pub options: BatchOptionsRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitBatchResponse {
    pub batch_id: BatchId,
    pub status: BatchStatus,
    pub status_url: String,
}

impl SubmitBatchResponse {
    pub fn accepted(batch_id: BatchId) -> Self {
        Self {
            batch_id,
            status: BatchStatus::Accepted,
            status_url: format!("/api/batch/{}", batch_id),
        }
    }
}

/// Job snapshot. Results are only present once the job is terminal.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStatusResponse {
    pub batch_id: BatchId,
    pub status: BatchStatus,
    pub progress: u8,
    pub completed_count: usize,
    pub total: usize,
    pub failed_count: usize,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<MemberResult>>,
}

impl From<&BatchJob> for BatchStatusResponse {
    fn from(job: &BatchJob) -> Self {
        Self {
            batch_id: job.id(),
            status: job.status(),
            progress: job.progress(),
            completed_count: job.completed_count(),
            total: job.total(),
            failed_count: job.failed_count(),
            created_at: job.created_at(),
            finished_at: job.finished_at(),
            error: job.error().map(str::to_string),
            results: job.is_terminal().then(|| job.results()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_fall_back_to_defaults() {
        let defaults = BatchDefaults {
            concurrency: 3,
            timeout: Some(Duration::from_secs(90)),
        };
        let options = BatchOptionsRequest::default().into_options(defaults);

        assert!(options.parallel);
        assert_eq!(options.max_concurrency(), 3);
        assert!(!options.fail_fast);
        assert_eq!(options.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn requested_options_override_defaults() {
        let request: BatchOptionsRequest = serde_json::from_value(json!({
            "parallel": false,
            "max_concurrency": 25,
            "fail_fast": true,
            "timeout_secs": 5
        }))
        .unwrap();
        let options = request.into_options(BatchDefaults::default());

        assert_eq!(options.chunk_size(), 1);
        assert_eq!(options.max_concurrency(), 10);
        assert!(options.fail_fast);
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn accepted_response_points_at_status_url() {
        let id = BatchId::new();
        let response = SubmitBatchResponse::accepted(id);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["status_url"], format!("/api/batch/{}", id));
    }
}
