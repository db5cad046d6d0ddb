//! Bounded exponential-backoff retry for model calls.
//!
//! The schedule mirrors the classic "wait exponential" rule: the wait after
//! attempt `n` is `multiplier * 2^(n-1)` clamped into `[min_wait, max_wait]`.
//! With the defaults that is 4s, 4s, 4s, 8s across five attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_secs(1),
            min_wait: Duration::from_secs(4),
            max_wait: Duration::from_secs(50),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.multiplier
            .saturating_mul(factor)
            .clamp(self.min_wait, self.max_wait)
    }
}

/// Runs `op` until it succeeds, fails permanently, or the policy's attempts
/// are spent. The final error is handed back as-is.
pub async fn retry_transient<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_transient(&e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "{} attempt {}/{} failed: {}; retrying after {}ms",
                    label,
                    attempt,
                    policy.max_attempts,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
