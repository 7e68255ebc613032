//! Fixed-interval retry for idempotent remote calls

use crate::error::ApiError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retry configuration for remote operations
///
/// Only wrap calls that are safe to repeat after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of invocations, including the first one
    pub max_attempts: u32,

    /// Pause between two invocations
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }
}

/// Invoke `operation` until it succeeds, reports an async timeout, or
/// `max_attempts` invocations have been made.
///
/// An async timeout is inconclusive rather than a failure and is returned to
/// the caller right away; the caller has to check the remote state itself.
/// There is no sleep after the last attempt.
pub async fn retry<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_async_timeout() => return Err(e),
            Err(e) => e,
        };

        if attempt >= max_attempts {
            error!(
                operation = %operation_name,
                attempt,
                error = %err,
                "Operation failed after max attempts"
            );
            return Err(err);
        }

        warn!(
            operation = %operation_name,
            attempt,
            error = %err,
            delay_secs = config.interval.as_secs(),
            "Operation failed, retrying"
        );
        tokio::time::sleep(config.interval).await;
    }
}
