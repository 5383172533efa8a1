//! Retry with exponential backoff.
//!
//! Wraps the flaky edges of the pipeline (GitHub API calls, model
//! invocations) so transient failures do not abort a review.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Raised when all retry attempts have been exhausted.
#[derive(Debug, Error)]
#[error("all {attempts} attempts failed: {source}")]
pub struct RetryError {
    pub attempts: u32,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retry attempts after the initial one.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Cap on exponential growth.
    pub max_delay: Duration,
    pub exponential_base: f64,
    /// Add up to ±25% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before the given retry attempt (0-indexed).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.as_secs_f64() * self.exponential_base.powi(attempt as i32);
        let mut delay = exp.min(self.max_delay.as_secs_f64());

        if self.jitter {
            let jitter_range = delay * 0.25;
            delay += rand::rng().random_range(-jitter_range..=jitter_range);
            delay = delay.max(0.0);
        }

        Duration::from_secs_f64(delay)
    }
}

/// Run an async operation, retrying with backoff on failure.
pub async fn retry_with_backoff<T, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut last_error: Option<anyhow::Error> = None;
    let mut attempts = 0;

    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempts = attempt + 1;
                if attempt < config.max_retries {
                    let delay = config.calculate_delay(attempt);
                    warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(RetryError {
        attempts,
        // The loop always runs at least once, so an error is present here.
        source: last_error.unwrap_or_else(|| anyhow::anyhow!("retry loop never ran")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            exponential_base: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        assert_eq!(config.calculate_delay(0), Duration::from_secs(1));
        assert_eq!(config.calculate_delay(1), Duration::from_secs(2));
        assert_eq!(config.calculate_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        assert_eq!(config.calculate_delay(10), Duration::from_secs(60));
    }

    #[test]
    fn test_jitter_stays_within_band() {
        let config = RetryConfig::default();
        for _ in 0..50 {
            let delay = config.calculate_delay(1).as_secs_f64();
            // 2s ± 25%
            assert!((1.5..=2.5).contains(&delay), "delay out of band: {}", delay);
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, anyhow::Error>(7) }
            },
            &fast_config(3),
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        anyhow::bail!("transient")
                    }
                    Ok("ok")
                }
            },
            &fast_config(3),
        )
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts() {
        let result: Result<(), _> = retry_with_backoff(
            || async { anyhow::bail!("always down") },
            &fast_config(2),
        )
        .await;
        let err = result.unwrap_err();
        // Initial attempt plus two retries.
        assert_eq!(err.attempts, 3);
        assert!(err.to_string().contains("3 attempts"));
    }
}
