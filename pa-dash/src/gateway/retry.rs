//! Retry combinator for transient gateway failures
//!
//! The gateway signals temporary unavailability with HTTP 503. Such calls are
//! retried after a fixed delay, up to `max_attempts` total attempts. Every
//! other error is returned immediately.

use std::future::Future;
use std::time::Duration;

use super::{GatewayError, GatewayResult};

/// Attempts and delay for [`retry_transient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first call included (minimum 1)
    pub max_attempts: u32,
    /// Fixed pause before each retry
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// One automatic retry after `delay`
    pub fn single_retry(delay: Duration) -> Self {
        Self::new(2, delay)
    }

    /// No retry at all
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single_retry(Duration::from_secs(2))
    }
}

/// Run a gateway operation, retrying transient failures per `policy`.
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If transient (503) and attempts remain: log WARN, sleep `delay`, retry
/// 4. Otherwise return the error unchanged
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "/api/discard")
/// * `policy` - Attempt budget and delay
/// * `operation` - Closure producing a fresh request future per attempt
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> GatewayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Gateway call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    "Gateway temporarily unavailable, will retry after delay"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => {
                if matches!(err, GatewayError::Unavailable) {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        "Gateway still unavailable, giving up"
                    );
                }
                return Err(err);
            }
        }
    }
}
