//! Transport retries shared by the HTTP provider adapters.

use std::future::Future;
use std::time::Duration;

use crate::domain::foundation::RequestId;
use crate::ports::AIError;

/// Delay added per attempt when the provider gives no `Retry-After`.
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Longest wait honoured from a rate-limit response.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Runs `call` until it succeeds, fails with a non-retryable error, or
/// `max_retries` extra attempts are used up. Timeouts are never retried.
///
/// Waits grow linearly (500ms, 1s, 1.5s...). A rate limit waits for the
/// provider's hint instead, capped at ten seconds.
pub(crate) async fn with_retries<F, Fut, T>(
    provider: &'static str,
    request_id: RequestId,
    max_retries: u32,
    mut call: F,
) -> Result<T, AIError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AIError>>,
{
    let mut attempt = 0;
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_retryable() || err.is_timeout() || attempt >= max_retries {
            return Err(err);
        }

        attempt += 1;
        let delay = backoff(&err, attempt);
        tracing::debug!(
            provider,
            request_id = %request_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Provider call failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

fn backoff(err: &AIError, attempt: u32) -> Duration {
    match err {
        AIError::RateLimited { retry_after_secs } if *retry_after_secs > 0 => {
            Duration::from_secs(u64::from(*retry_after_secs)).min(MAX_RETRY_AFTER)
        }
        _ => BACKOFF_STEP * attempt,
    }
}
