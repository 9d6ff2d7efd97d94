//! Transport retry for idempotent collaborator reads.
//!
//! Agent status queries and key-set fetches go through here. Writes to the
//! agent (invitations, offers, issuance, revocation) are sent once.
//! Only transport errors are retried; any HTTP response, including 4xx and
//! 5xx, goes back to the caller as-is.

use std::future::Future;
use std::time::Duration;

use credguard_vc::elapsed_millis;

/// Default retry budget after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);

/// Retry budget for one collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` sends once.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each one after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_retries(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// `max_retries` retries with the default 200ms base delay.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Send a read to `endpoint`, retrying transport failures.
    ///
    /// `send` is called up to `max_retries + 1` times.
    pub(crate) async fn send<F, Fut>(
        &self,
        endpoint: &str,
        send: F,
    ) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        for retry in 0..self.max_retries {
            match send().await {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    let delay = self.delay_for(retry);
                    tracing::warn!(
                        endpoint,
                        attempt = retry + 1,
                        max_retries = self.max_retries,
                        delay_ms = elapsed_millis(delay),
                        error = %err,
                        "collaborator unreachable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
        send().await
    }
}
