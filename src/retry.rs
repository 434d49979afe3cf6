//! Bounded retry loop with exponential backoff for Jira API requests.
//!
//! Retryable conditions are transport-level failures, 429 and 5xx responses;
//! any other response is returned to the caller on the first attempt. A
//! server-provided `Retry-After` hint takes precedence over the computed
//! backoff.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use crate::error::Result;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Injectable delay primitive so tests can replace real waiting with a no-op.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production delay backed by the tokio timer.
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct RetryPolicy {
    max_attempts: u32,
    delay: Arc<dyn Delay>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self::with_delay(max_attempts, Arc::new(TokioDelay))
    }

    pub fn with_delay(max_attempts: u32, delay: Arc<dyn Delay>) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Execute `request` through `transport`, retrying as needed.
    ///
    /// Returns `Ok` with the final response even when that response is a
    /// non-2xx — the caller classifies it. A transport-level failure is
    /// propagated as `Err` only once attempts are exhausted. Both paths
    /// deliberately converge on the caller's failure handling.
    pub async fn execute(
        &self,
        transport: &dyn Transport,
        request: &ApiRequest,
    ) -> Result<ApiResponse> {
        let mut attempt: u32 = 1;

        loop {
            match transport.send(request).await {
                Err(e) => {
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                    let wait = backoff(attempt);
                    tracing::warn!(
                        url = %request.url,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        wait_secs = wait.as_secs(),
                        error = %e,
                        "Request failed before a response, retrying"
                    );
                    self.delay.sleep(wait).await;
                }
                Ok(response) => {
                    let status = response.status;

                    if status.is_success() {
                        return Ok(response);
                    }

                    // Non-retryable client error: hand back immediately,
                    // the caller treats it as terminal
                    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
                        return Ok(response);
                    }

                    if attempt >= self.max_attempts {
                        return Ok(response);
                    }

                    let wait = retry_after(&response.headers).unwrap_or_else(|| backoff(attempt));
                    tracing::warn!(
                        url = %request.url,
                        status = status.as_u16(),
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        wait_secs = wait.as_secs(),
                        "Server asked for backoff, retrying"
                    );
                    self.delay.sleep(wait).await;
                }
            }

            attempt += 1;
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Parse a `Retry-After` seconds hint. Header-name lookup is
/// case-insensitive by construction of `HeaderMap`; unparseable values
/// fall back to the computed backoff.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
