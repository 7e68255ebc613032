//! Poll-with-deadline for "is this resource ready yet" checks

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Poll configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause before every check
    pub interval: Duration,

    /// Give up once this much time has passed since the first check was scheduled
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Outcome of [`poll_until`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    TimedOut,
}

impl<T> PollOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Call `check` every `interval` until it yields `Some`, the deadline passes,
/// or it fails.
///
/// The first check happens after one interval: freshly registered resources
/// need a moment before the API reports anything useful about them.
pub async fn poll_until<T, E, F, Fut>(config: &PollConfig, mut check: F) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    let mut attempt = 0u32;

    loop {
        sleep(config.interval).await;
        attempt += 1;

        if let Some(value) = check().await? {
            tracing::debug!(attempt, "resource is ready");
            return Ok(PollOutcome::Ready(value));
        }

        if started.elapsed() >= config.timeout {
            tracing::debug!(attempt, "gave up waiting for resource");
            return Ok(PollOutcome::TimedOut);
        }
    }
}
