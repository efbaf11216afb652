use std::sync::Arc;

use cronx_model::{TaskLogId, TaskLogStatus, TaskLogUpdate};
use tracing::{error, info, warn};

use crate::store::{StoreError, TaskLogStore};

/// Result text written to a task log cancelled through the orphan path.
pub const ORPHAN_RESULT: &str = "manually stopped after system restart";

/// How the orphan path treats a log that already reached a terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Always write `Cancel`, whatever the log currently holds.
    #[default]
    Overwrite,
    /// Only write `Cancel` while the log is still `Running` or `Waiting`.
    OnlyIfRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The log was marked cancelled.
    Updated,
    /// The store had no row for the id.
    NotFound,
    /// Left untouched because it was already terminal.
    Skipped(TaskLogStatus),
    /// The store failed; the reason is logged and carried here.
    Failed(String),
}

/// Marks task logs cancelled when no in-process cancel handle exists for
/// them. Never fails towards its caller.
#[derive(Clone)]
pub struct OrphanReconciler {
    store: Arc<dyn TaskLogStore>,
    policy: ReconcilePolicy,
}

impl std::fmt::Debug for OrphanReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrphanReconciler")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl OrphanReconciler {
    pub fn new(store: Arc<dyn TaskLogStore>, policy: ReconcilePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub async fn reconcile(&self, task_log_id: TaskLogId) -> ReconcileOutcome {
        if self.policy == ReconcilePolicy::OnlyIfRunning {
            match self.store.status(task_log_id).await {
                Ok(Some(status)) if status.is_terminal() => {
                    info!(
                        target: "cronx.reconcile",
                        task_log_id,
                        ?status,
                        "task log already finished; not cancelling"
                    );
                    return ReconcileOutcome::Skipped(status);
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!(target: "cronx.reconcile", task_log_id, "task log not found");
                    return ReconcileOutcome::NotFound;
                }
                Err(e) => {
                    error!(target: "cronx.reconcile", task_log_id, error = %e, "reading task log failed");
                    return ReconcileOutcome::Failed(e.to_string());
                }
            }
        }

        let update = TaskLogUpdate::new(TaskLogStatus::Cancel, ORPHAN_RESULT);
        match self.store.update(task_log_id, update).await {
            Err(StoreError::NotFound(_)) => {
                warn!(target: "cronx.reconcile", task_log_id, "task log not found");
                ReconcileOutcome::NotFound
            }
            Ok(()) => {
                info!(target: "cronx.reconcile", task_log_id, "orphan task log marked cancelled");
                ReconcileOutcome::Updated
            }
            Err(e) => {
                error!(target: "cronx.reconcile", task_log_id, error = %e, "updating task log failed");
                ReconcileOutcome::Failed(e.to_string())
            }
        }
    }
}
