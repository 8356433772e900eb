//! Retry utilities for async operations
//!
//! Provides configurable retry policies with exponential backoff and jitter
//! for handling transient failures in async operations.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Configuration for retrying failed operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: usize,

    /// Initial interval between retries
    pub initial_interval: Duration,

    /// Multiplier for the interval after each retry
    pub backoff_factor: f64,

    /// Maximum interval between retries
    pub max_interval: Duration,

    /// Whether to add random jitter to intervals
    pub jitter: bool,
}

impl RetryPolicy {
    /// Create a new retry policy with the given max attempts
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_interval: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(60),
            jitter: true,
        }
    }

    /// Set the initial interval between retries
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the backoff factor
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the maximum interval between retries
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate the delay before the retry following the given attempt (0-indexed)
    ///
    /// Uses exponential backoff: initial_interval * (backoff_factor ^ attempt),
    /// capped at max_interval, with optional jitter.
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        let base = self.initial_interval.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_interval.as_secs_f64());

        let final_delay = if self.jitter {
            let mut rng = rand::thread_rng();
            capped * rng.gen_range(0.5..=1.5)
        } else {
            capped
        };

        Duration::from_secs_f64(final_delay)
    }

    /// Check if more attempts are allowed after the given number of attempts
    pub fn should_retry(&self, attempts: usize) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Execute an async operation with retry logic
///
/// The operation must be retryable/idempotent. Returns the first success,
/// or the last error once all attempts are exhausted.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, operation: F) -> std::result::Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                tracing::debug!("Attempt {} failed: {}", attempt + 1, error);
                last_error = Some(error);

                if !policy.should_retry(attempt + 1) {
                    break;
                }

                let delay = policy.calculate_delay(attempt);
                tracing::debug!("Waiting {:?} before retry", delay);
                tokio::time::sleep(delay).await;
            }
        }
    }

    Err(last_error.expect("Should have error after exhausting retries"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = RetryPolicy::new(4)
            .with_initial_interval(Duration::from_millis(200))
            .with_jitter(false);

        assert_eq!(policy.calculate_delay(0), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(400));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy::new(10)
            .with_initial_interval(Duration::from_secs(1))
            .with_max_interval(Duration::from_secs(4))
            .with_jitter(false);

        assert_eq!(policy.calculate_delay(8), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::new(3)
            .with_initial_interval(Duration::from_millis(1))
            .with_jitter(false);

        let counter = attempts.clone();
        let result = with_retry(&policy, || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_attempts() {
        let policy = RetryPolicy::new(2)
            .with_initial_interval(Duration::from_millis(1))
            .with_jitter(false);

        let result: Result<(), String> =
            with_retry(&policy, || async { Err("always fails".to_string()) }).await;

        assert_eq!(result, Err("always fails".to_string()));
    }
}
