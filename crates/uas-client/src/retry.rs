//! Backoff policy for controller read calls.
//!
//! Only transport failures (refused connections, timeouts) are retried. A
//! controller that answers, even with an error status, answered; its response
//! goes back to the caller untouched. Alias updates are never retried.

use std::future::Future;
use std::time::Duration;

/// How often and how patiently a read is re-sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Wait before the first retry; doubled for each later one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Login, site listing and client listing: 200ms, 400ms, 800ms.
    pub const READS: Self = Self {
        max_retries: 3,
        base_delay: Duration::from_millis(200),
    };

    /// Wait after failed attempt number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }

    /// Send `request`, re-sending it on transport failure.
    ///
    /// `request` is invoked at most `max_retries + 1` times; the last
    /// transport error is returned when every attempt fails.
    pub async fn send<F, Fut>(
        &self,
        endpoint: &str,
        request: F,
    ) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        loop {
            match request().await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        endpoint,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "controller unreachable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
