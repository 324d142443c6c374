//! Retries with exponential backoff for transient backend failures.

use crate::generator::TestGenerator;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use testbench_core::{GeneratorKind, Result};
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// `retries` extra attempts after the first.
    pub fn with_retries(retries: usize) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Calculate delay for the given attempt number (0-based)
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let base_delay_ms = self.base_delay.as_millis() as f64;
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = base_delay_ms * self.backoff_multiplier.powi(exponent);
        let delay_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.add_jitter {
            // up to 25% either way
            let jitter = (rand::random::<f64>() - 0.5) * 0.5 * delay_ms;
            (delay_ms + jitter).max(0.0)
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay as u64)
    }
}

/// Retry a potentially failing operation with exponential backoff.
///
/// Only errors for which [`testbench_core::TestbenchError::is_recoverable`] holds are
/// retried; anything else is returned immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    mut operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        "Operation '{}' succeeded on attempt {} after {} previous failures",
                        operation_name,
                        attempt + 1,
                        attempt
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_recoverable() && attempt + 1 < attempts => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "Operation '{}' failed on attempt {}, retrying in {:?}: {}",
                    operation_name,
                    attempt + 1,
                    delay,
                    e
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_recoverable() {
                    error!(
                        "Operation '{}' failed after {} attempts: {}",
                        operation_name, attempts, e
                    );
                } else {
                    debug!("Operation '{}' failed with non-recoverable error: {}", operation_name, e);
                }
                return Err(e);
            }
        }
    }
}

/// Wraps a generator so transient failures are retried.
pub struct RetryingGenerator<G> {
    inner: G,
    config: RetryConfig,
}

impl<G: TestGenerator> RetryingGenerator<G> {
    pub fn new(inner: G, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: TestGenerator> TestGenerator for RetryingGenerator<G> {
    fn kind(&self) -> GeneratorKind {
        self.inner.kind()
    }

    async fn generate_tests(&self, prompt: &str, code: &str) -> Result<String> {
        let name = format!("{} generate_tests", self.inner.kind());
        retry_with_backoff(
            || self.inner.generate_tests(prompt, code),
            &self.config,
            &name,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use testbench_core::TestbenchError;

    fn fast(max_attempts: usize) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            add_jitter: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            base_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
            add_jitter: false,
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        assert!(config.delay_for_attempt(10) <= config.max_delay);
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&attempt_count);

        let operation = move || {
            let count = Arc::clone(&count);
            async move {
                if count.fetch_add(1, Ordering::SeqCst) + 1 < 3 {
                    Err(TestbenchError::http(503, "busy"))
                } else {
                    Ok("tests")
                }
            }
        };

        let result = retry_with_backoff(operation, &fast(5), "test").await;
        assert_eq!(result.unwrap(), "tests");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_recoverable_is_not_retried() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&attempt_count);

        let operation = move || {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestbenchError::http(401, "bad key"))
            }
        };

        let result = retry_with_backoff(operation, &fast(5), "test").await;
        assert!(matches!(result, Err(TestbenchError::Http { status: 401, .. })));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let attempt_count = Arc::new(AtomicUsize::new(0));
        let count = Arc::clone(&attempt_count);

        let operation = move || {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestbenchError::timeout("slow"))
            }
        };

        let result = retry_with_backoff(operation, &fast(3), "test").await;
        assert!(matches!(result, Err(TestbenchError::Timeout(_))));
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_with_retries() {
        assert_eq!(RetryConfig::with_retries(2).max_attempts, 3);
        assert_eq!(RetryConfig::with_retries(0).max_attempts, 1);
    }
}
