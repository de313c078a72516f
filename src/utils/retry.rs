use crate::constants::REQUEST_RETRIES;
use crate::error::AppResult;
use log::{error, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration for outbound requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::single_retry()
    }
}

impl RetryConfig {
    /// One retry after the first failure, for queries and mutations alike.
    pub const fn single_retry() -> Self {
        Self {
            max_attempts: REQUEST_RETRIES + 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }
}

/// Execute an operation, retrying transient failures with exponential backoff.
///
/// Errors that are not transient (see [`crate::error::AppError::is_transient`]) are returned
/// immediately.
pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> AppResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.base_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!("Operation '{}' succeeded after {} attempts", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) if attempt < max_attempts && e.is_transient() => {
                warn!(
                    "Operation '{}' failed on attempt {} of {}: {}. Retrying in {:?}",
                    operation_name, attempt, max_attempts, e, delay
                );
                sleep(delay).await;
                delay = next_delay(delay, config);
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    error!(
                        "Operation '{}' failed after {} attempts: {}",
                        operation_name, attempt, e
                    );
                }
                return Err(e);
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let scaled = Duration::from_millis((delay.as_millis() as f64 * config.backoff_multiplier) as u64);
    scaled.min(config.max_delay)
}
