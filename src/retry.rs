//! Retry with exponential backoff for transient remote-service failures.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Errors that can be inspected for a transient-overload signal.
pub trait RetryableError {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Unit delay the exponential schedule is built from.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Delay before re-running attempt `attempt` (0-indexed):
/// `base * 2^attempt` plus up to one extra `base` of jitter.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let exponential = base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    let jitter = base.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
    exponential + jitter
}

/// Runs `op`, retrying on transient failures up to `policy.max_retries`
/// times. Each retry is reported to `on_retry` with the 1-indexed attempt
/// number before the backoff sleep, so callers can surface progress.
/// Non-transient failures, and the last failure once retries are exhausted,
/// are propagated unchanged.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
    mut on_retry: impl FnMut(u32),
) -> Result<T, E>
where
    E: RetryableError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if err.is_transient() && attempt < policy.max_retries {
                    on_retry(attempt + 1);
                    let delay = backoff_delay(attempt, policy.base_delay);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, backing off: {err}"
                    );
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum FakeError {
        #[error("HTTP 503: overloaded")]
        Overloaded,
        #[error("bad request")]
        Permanent,
    }

    impl RetryableError for FakeError {
        fn is_transient(&self) -> bool {
            matches!(self, FakeError::Overloaded)
        }
    }

    #[test]
    fn backoff_delay_is_exponential_with_bounded_jitter() {
        let base = Duration::from_millis(1000);
        for attempt in 0..4 {
            let floor = Duration::from_millis(1000 * (1 << attempt));
            let ceiling = floor + base;
            for _ in 0..50 {
                let delay = backoff_delay(attempt, base);
                assert!(delay >= floor, "attempt {attempt}: {delay:?} < {floor:?}");
                assert!(delay < ceiling, "attempt {attempt}: {delay:?} >= {ceiling:?}");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_then_success_returns_value() {
        let calls = AtomicU32::new(0);
        let mut observed = Vec::new();
        let result = with_retry(
            &RetryPolicy::default(),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(FakeError::Overloaded)
                    } else {
                        Ok("done")
                    }
                }
            },
            |attempt| observed.push(attempt),
        )
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(observed, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn always_transient_fails_after_max_plus_one_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(
            &RetryPolicy::default(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Overloaded) }
            },
            |_| {},
        )
        .await;
        assert!(matches!(result, Err(FakeError::Overloaded)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_failure_is_immediate_with_zero_delay() {
        let start = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);
        let mut observed = Vec::new();
        let result: Result<(), _> = with_retry(
            &RetryPolicy::default(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Permanent) }
            },
            |attempt| observed.push(attempt),
        )
        .await;
        assert!(matches!(result, Err(FakeError::Permanent)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(observed.is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_never_reports_retries() {
        let mut observed = Vec::new();
        let result: Result<u8, FakeError> = with_retry(
            &RetryPolicy::default(),
            || async { Ok(7) },
            |attempt| observed.push(attempt),
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert!(observed.is_empty());
    }
}
