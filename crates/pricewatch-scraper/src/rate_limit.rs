//! Politeness delays and retry utilities for retailer requests.
//!
//! Every page GET is preceded by a short random pause ([`RetryPolicy::request_jitter`])
//! and wrapped in [`retry_with_backoff`], which retries transient failures
//! (timeouts, connection errors, 429, and 500/502/503/504) with exponential
//! back-off and ±25 % jitter. Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ScraperError;

/// Upper bound on any single back-off sleep.
const MAX_DELAY_MS: u64 = 60_000;

/// Request pacing and retry settings shared by every retailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    /// Base for the back-off schedule: `backoff_base_ms * 2^(n-1)` before the
    /// n-th retry.
    pub backoff_base_ms: u64,
    /// Random pause before each page request, drawn from
    /// `jitter_min_ms..=jitter_max_ms`.
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_ms: 1_500,
            jitter_min_ms: 700,
            jitter_max_ms: 1_600,
        }
    }
}

impl RetryPolicy {
    /// No retries and no pauses. Used by tests and one-shot tooling.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
            jitter_min_ms: 0,
            jitter_max_ms: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &pricewatch_core::AppConfig) -> Self {
        Self {
            max_retries: config.scraper_max_retries,
            backoff_base_ms: config.scraper_retry_backoff_base_ms,
            jitter_min_ms: config.scraper_jitter_min_ms,
            jitter_max_ms: config.scraper_jitter_max_ms,
        }
    }

    /// Random pause to take before a page request.
    #[must_use]
    pub fn request_jitter(&self) -> Duration {
        let lo = self.jitter_min_ms.min(self.jitter_max_ms);
        let hi = self.jitter_min_ms.max(self.jitter_max_ms);
        if hi == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }
}

/// Returns `true` if `err` is worth retrying after a back-off delay.
///
/// Retriable: network timeouts and connection failures, HTTP 429, and the
/// 5xx statuses mapped to [`ScraperError::ServerError`]. A 404, any other
/// status, or a malformed URL will not change on retry.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(e) => e.is_timeout() || e.is_connect(),
        ScraperError::RateLimited { .. } | ScraperError::ServerError { .. } => true,
        ScraperError::NotFound { .. }
        | ScraperError::UnexpectedStatus { .. }
        | ScraperError::InvalidUrl { .. } => false,
    }
}

/// Sleep before retry number `attempt` (1-based).
///
/// `floor_ms` is a server-requested minimum (`Retry-After`); `jitter_factor`
/// scales the exponential delay and is expected in `0.75..=1.25`. The result
/// never exceeds [`MAX_DELAY_MS`].
fn backoff_delay(backoff_base_ms: u64, attempt: u32, floor_ms: u64, jitter_factor: f64) -> Duration {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(20));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (computed.min(MAX_DELAY_MS) as f64 * jitter_factor) as u64;
    Duration::from_millis(jittered.max(floor_ms).min(MAX_DELAY_MS))
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_500`:
///
/// | Retry | Sleep before it                  |
/// |-------|----------------------------------|
/// | 1     | 1 500 ms × 2⁰ ± 25 % jitter      |
/// | 2     | 1 500 ms × 2¹ ± 25 % jitter      |
/// | 3     | 1 500 ms × 2² ± 25 % jitter      |
///
/// A 429 carrying `Retry-After` waits at least that long. Every sleep is
/// capped at 60 s. When retries run out the last error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let floor_ms = match &err {
                    ScraperError::RateLimited {
                        retry_after_secs, ..
                    } => retry_after_secs.saturating_mul(1_000),
                    _ => 0,
                };
                let delay = backoff_delay(
                    policy.backoff_base_ms,
                    attempt,
                    floor_ms,
                    rand::random::<f64>() * 0.5 + 0.75,
                );
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(MAX_DELAY_MS),
                    error = %err,
                    "transient retailer error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
