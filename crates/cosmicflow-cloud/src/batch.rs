//! Bounded-concurrency fan-out over independent rule operations

use crate::error::{BatchError, CloudError, Result};
use crate::rule::{Rule, RuleSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Runs one operation per rule with a cap on in-flight calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    /// Maximum number of operations in flight at once
    pub concurrency: usize,

    /// Pause before each dispatch.
    ///
    /// This is a naive client-side throttle that keeps a large batch from
    /// hitting the API as one burst. It is not a rate limiter.
    pub dispatch_delay: Duration,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self {
            concurrency: 10,
            dispatch_delay: Duration::from_millis(500),
        }
    }
}

/// Result of one batch run
#[derive(Debug)]
pub struct BatchOutcome<R: Rule> {
    /// Rules whose operation succeeded, carrying the id returned by it
    pub succeeded: RuleSet<R>,

    /// Rules whose operation failed, unchanged
    pub failed: RuleSet<R>,

    /// Every failure, `None` when all rules succeeded
    pub error: Option<BatchError>,
}

impl<R: Rule> BatchOutcome<R> {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl BatchExecutor {
    pub fn new(concurrency: usize, dispatch_delay: Duration) -> Self {
        Self {
            concurrency,
            dispatch_delay,
        }
    }

    /// Run `operation` once for every rule and wait for all of them.
    ///
    /// The operation returns the rule's new remote id: the created id for a
    /// create, an empty string for a delete. A failing rule never cancels the
    /// others. Rules are independent, so no order is guaranteed between them.
    pub async fn run<R, F, Fut>(&self, rules: RuleSet<R>, operation: F) -> BatchOutcome<R>
    where
        R: Rule,
        F: Fn(R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let total = rules.len();
        let operation = Arc::new(operation);
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut pending: Vec<(R, JoinHandle<Result<String>>)> = Vec::with_capacity(total);

        for rule in rules {
            sleep(self.dispatch_delay).await;

            let sem = Arc::clone(&semaphore);
            let op = Arc::clone(&operation);
            let task_rule = rule.clone();
            let handle = tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| CloudError::Worker(e.to_string()))?;
                op(task_rule).await
            });
            pending.push((rule, handle));
        }

        let mut succeeded = RuleSet::new();
        let mut failed = RuleSet::new();
        let mut errors = BatchError::new();

        for (mut rule, handle) in pending {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(CloudError::Worker(e.to_string())),
            };

            match result {
                Ok(id) => {
                    rule.set_remote_id(id);
                    succeeded.insert(rule);
                }
                Err(e) => {
                    tracing::warn!(rule = %rule.describe(), error = %e, "rule operation failed");
                    errors.push(rule.describe(), e);
                    failed.insert(rule);
                }
            }
        }

        tracing::debug!(
            total,
            succeeded = succeeded.len(),
            failed = failed.len(),
            "batch finished"
        );

        BatchOutcome {
            succeeded,
            failed,
            error: errors.into_option(),
        }
    }
}
