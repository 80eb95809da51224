//! Retry helper shared by the HTTP clients.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{MlError, MlResult};

/// Base delay before the first retry; doubled on every attempt.
const BASE_DELAY_MS: u64 = 500;

/// Upper bound for a single backoff delay.
const MAX_DELAY_MS: u64 = 30_000;

/// Delay before retry number `attempt` (0-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    let millis = BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(millis.min(MAX_DELAY_MS))
}

/// Run `operation`, retrying retryable failures up to `max_retries` times.
pub async fn with_retry<F, Fut, T>(label: &str, max_retries: u32, operation: F) -> MlResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = MlResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = backoff_delay(attempt);
                warn!(
                    "{} request failed (attempt {}), retrying in {:?}: {}",
                    label,
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Convert a reqwest timeout into [`MlError::Timeout`].
pub(crate) fn map_send_error(e: reqwest::Error, timeout: Duration) -> MlError {
    if e.is_timeout() {
        MlError::Timeout(timeout.as_secs())
    } else {
        MlError::Network(e)
    }
}
