//! Retry policy for transient failures.

use std::future::Future;
use std::time::Duration;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed(Duration),
    /// Doubles after each retry, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay before retry number `retry` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Self::Fixed(d) => d,
            Self::Exponential { initial, max } => {
                let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
                initial.checked_mul(factor).unwrap_or(max).min(max)
            }
        }
    }
}

/// How many times, and how patiently, to retry an operation.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use boudoir_lib::retry::{Backoff, RetryPolicy};
///
/// // Data layer default: 3 retries, 1 second apart
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries, 3);
///
/// let custom = RetryPolicy::default()
///     .max_retries(5)
///     .backoff(Backoff::Exponential {
///         initial: Duration::from_millis(100),
///         max: Duration::from_secs(2),
///     });
///
/// let none = RetryPolicy::none();
/// assert_eq!(none.max_retries, 0);
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::Fixed(Duration::from_secs(1)),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Runs `op` until it succeeds, fails with an error `is_retryable`
    /// rejects, or the retry budget is spent. The last error is returned.
    pub async fn retry<T, E, F, Fut>(&self, mut op: F, is_retryable: impl Fn(&E) -> bool) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    let delay = self.backoff.delay(attempt);
                    attempt += 1;
                    log::warn!(
                        "Transient failure (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use super::*;

    fn quick(retries: u32) -> RetryPolicy {
        RetryPolicy::default().max_retries(retries).backoff(Backoff::Fixed(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn test_retryable_error_uses_whole_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = quick(3)
            .retry(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("busy".to_string())
                },
                |_| true,
            )
            .await;
        assert_eq!(result, Err("busy".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = quick(3)
            .retry(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("constraint".to_string())
                },
                |e| e == "busy",
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = quick(3)
            .retry(
                || async {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 { Err("busy".to_string()) } else { Ok(n) }
                },
                |_| true,
            )
            .await;
        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_none_makes_single_attempt() {
        let calls = AtomicU32::new(0);
        let _: Result<(), String> = RetryPolicy::none()
            .retry(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("busy".to_string())
                },
                |_| true,
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(500),
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(3), Duration::from_millis(500));
        assert_eq!(backoff.delay(40), Duration::from_millis(500));
    }
}
