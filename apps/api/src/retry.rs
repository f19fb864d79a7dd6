//! Bounded retry with exponential backoff, shared by page fetches and LLM
//! calls. Sleeps go through `tokio::time`, so paused-clock tests drive them.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    Permanent,
}

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn kind(&self) -> FailureKind;
}

/// The error that ended a retried operation.
#[derive(Debug)]
pub struct GaveUp<E> {
    pub error: E,
    /// Attempts made, the failing one included.
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): base, 2×base, 4×base, ...
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(retry.saturating_sub(1))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Runs `op` until it succeeds, fails permanently or runs out of attempts.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, GaveUp<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error)
                    if error.kind() == FailureKind::Permanent || attempt >= max_attempts =>
                {
                    return Err(GaveUp {
                        error,
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{label}: attempt {attempt}/{max_attempts} failed ({error}), retrying after {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum Flaky {
        Busy,
        Broken,
    }

    impl Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Retryable for Flaky {
        fn kind(&self) -> FailureKind {
            match self {
                Flaky::Busy => FailureKind::Transient,
                Flaky::Broken => FailureKind::Permanent,
            }
        }
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_backoff: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_backoff_doubles_per_retry() {
        let policy = policy(3);
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_retry_until_success() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = policy(2)
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(Flaky::Busy)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        // 500ms + 1000ms of backoff
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let err = policy(5)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Flaky::Broken) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.error, Flaky::Broken);
        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_last_error_and_attempts() {
        let err = policy(2)
            .run("test", || async { Err::<(), _>(Flaky::Busy) })
            .await
            .unwrap_err();

        assert_eq!(err.error, Flaky::Busy);
        assert_eq!(err.attempts, 3);
    }
}
