//! Desired vs observed reconciliation of a rule collection

use crate::batch::BatchExecutor;
use crate::classify;
use crate::error::{BatchError, CloudError, Result};
use crate::rule::{Rule, RuleSet};
use std::future::Future;
use std::sync::Arc;

/// Result of one reconcile pass
///
/// `rules` is the state to persist. It is always meaningful, also when
/// `error` is set: it holds every rule that exists remotely after the pass.
#[derive(Debug)]
pub struct Reconciled<R: Rule> {
    pub rules: RuleSet<R>,
    pub error: Option<BatchError>,
}

impl<R: Rule> Reconciled<R> {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Bring the remote rule collection from `observed` to `desired`.
///
/// Removals run before additions. A failed delete keeps its rule (and remote
/// id) in the result so the next pass retries it; a delete answered with
/// "already gone" counts as done. Failed creates are left out of the result
/// and reported. Observed rules without a remote id are treated as absent.
///
/// `create` returns the new remote id. `delete` receives rules that carry a
/// remote id.
pub async fn reconcile<R, C, CFut, D, DFut>(
    executor: &BatchExecutor,
    desired: &RuleSet<R>,
    observed: RuleSet<R>,
    create: C,
    delete: D,
) -> Reconciled<R>
where
    R: Rule,
    C: Fn(R) -> CFut + Send + Sync + 'static,
    CFut: Future<Output = Result<String>> + Send + 'static,
    D: Fn(R) -> DFut + Send + Sync + 'static,
    DFut: Future<Output = Result<()>> + Send + 'static,
{
    let observed: RuleSet<R> = observed.into_iter().filter(|r| r.is_created()).collect();

    let to_remove = observed.difference(desired);
    let to_add = desired.difference(&observed);
    let mut working = observed.intersection(desired);

    tracing::debug!(
        keep = working.len(),
        add = to_add.len(),
        remove = to_remove.len(),
        "reconciling rules"
    );

    let mut remove_error = None;
    if !to_remove.is_empty() {
        let delete = Arc::new(delete);
        let outcome = executor
            .run(to_remove, move |rule: R| {
                let delete = Arc::clone(&delete);
                async move {
                    let id = rule.remote_id().to_string();
                    match delete(rule).await {
                        Ok(()) => Ok(String::new()),
                        Err(e) if classify::is_gone_cloud(&e, &id) => {
                            tracing::debug!(id = %id, "rule already deleted remotely");
                            Ok(String::new())
                        }
                        Err(e) => Err(e),
                    }
                }
            })
            .await;
        working.extend(outcome.failed);
        remove_error = outcome.error;
    }

    let mut add_error = None;
    if !to_add.is_empty() {
        let outcome = executor.run(to_add, create).await;
        working.extend(outcome.succeeded);
        add_error = outcome.error;
    }

    Reconciled {
        rules: working,
        error: BatchError::combine(remove_error, add_error),
    }
}

/// Delete every rule of `rules`, e.g. when the parent resource is destroyed.
/// Returns the rules that could not be deleted.
pub async fn delete_all<R, D, DFut>(executor: &BatchExecutor, rules: RuleSet<R>, delete: D) -> Reconciled<R>
where
    R: Rule,
    D: Fn(R) -> DFut + Send + Sync + 'static,
    DFut: Future<Output = Result<()>> + Send + 'static,
{
    reconcile(executor, &RuleSet::new(), rules, unreachable_create::<R>, delete).await
}

async fn unreachable_create<R: Rule>(rule: R) -> Result<String> {
    Err(CloudError::Worker(format!(
        "create requested while deleting {}",
        rule.describe()
    )))
}
