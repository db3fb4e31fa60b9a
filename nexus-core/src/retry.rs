//! Retry utilities for outbound calls.
//!
//! The policy is data (`RetryConfig`); the caller decides which errors are
//! transient through a predicate.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single backoff.
    pub max_backoff: Duration,
    /// Multiplier applied per attempt; 1.0 gives a fixed delay.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// A single retry after a fixed delay.
    pub fn once_after(delay: Duration) -> Self {
        Self {
            max_retries: 1,
            initial_backoff: delay,
            max_backoff: delay,
            backoff_multiplier: 1.0,
        }
    }

    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let backoff =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let backoff_ms = backoff.min(self.max_backoff.as_millis() as f64) as u64;
        Duration::from_millis(backoff_ms)
    }
}

/// Run `f` until it succeeds, the error is not retryable, or attempts run out.
pub async fn retry_with<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation_name: &str,
    is_retryable: P,
    f: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    return Err(err);
                }

                if attempt >= config.max_retries {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        error = %err,
                        "Call failed after max retries"
                    );
                    return Err(err);
                }

                let backoff = config.backoff_duration(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    error = %err,
                    backoff_ms = backoff.as_millis() as u64,
                    "Call failed, retrying after backoff"
                );

                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_grows_and_caps() {
        let config = RetryConfig {
            max_backoff: Duration::from_millis(300),
            ..Default::default()
        };

        assert_eq!(config.backoff_duration(0), Duration::from_millis(100));
        assert_eq!(config.backoff_duration(1), Duration::from_millis(200));
        assert_eq!(config.backoff_duration(2), Duration::from_millis(300));
    }

    #[test]
    fn once_after_is_fixed() {
        let config = RetryConfig::once_after(Duration::from_millis(250));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.backoff_duration(0), Duration::from_millis(250));
        assert_eq!(config.backoff_duration(3), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn retries_transient_error_once() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::once_after(Duration::from_millis(1));

        let result = retry_with(&config, "op", |e: &String| e == "timeout", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("timeout".to_string())
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_one_retry() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::once_after(Duration::from_millis(1));

        let result: Result<i32, String> = retry_with(&config, "op", |_| true, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("timeout".to_string())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::default();

        let result: Result<i32, String> = retry_with(&config, "op", |_| false, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("not found".to_string())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
