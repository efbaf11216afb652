use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use cronx_model::{TaskKey, TaskLogId, TaskRequest, WorkerAddr};
use cronx_rpc::{ChannelPool, ConnectionPool, proto};
use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::{
    config::DispatcherConfig,
    error::{DispatchError, FailureKind},
    reconcile::{OrphanReconciler, ReconcileOutcome},
    registry::CancelRegistry,
    store::TaskLogStore,
};

/// What [`Dispatcher::stop`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// A live dispatch was found and its cancel handle fired.
    Signalled,
    /// Nothing was in flight under the key; the task log went through the
    /// orphan reconciler instead.
    Reconciled(ReconcileOutcome),
}

/// Runs tasks on workers and stops them on request.
///
/// Cloning is cheap: the pool, the registry and the store are shared.
#[derive(Clone)]
pub struct Dispatcher {
    pool: Arc<dyn ConnectionPool>,
    registry: CancelRegistry,
    reconciler: OrphanReconciler,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("in_flight", &self.registry.len())
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        pool: Arc<dyn ConnectionPool>,
        store: Arc<dyn TaskLogStore>,
        cfg: &DispatcherConfig,
    ) -> Self {
        Self {
            pool,
            registry: CancelRegistry::new(),
            reconciler: OrphanReconciler::new(store, cfg.reconcile),
        }
    }

    /// Build a dispatcher backed by a [`ChannelPool`].
    pub fn from_config(
        cfg: &DispatcherConfig,
        store: Arc<dyn TaskLogStore>,
    ) -> Result<Self, String> {
        cfg.validate()?;
        let pool = Arc::new(ChannelPool::new(cfg.pool.clone()));
        Ok(Self::new(pool, store, cfg))
    }

    pub fn registry(&self) -> &CancelRegistry {
        &self.registry
    }

    /// Run `req` on the worker at `addr` and return its output.
    ///
    /// The call is bounded by the request's normalised timeout and can be
    /// interrupted with [`Dispatcher::stop`]. Its cancel handle is registered
    /// for exactly the duration of this call. A panic anywhere below this
    /// point is reported as [`DispatchError::Internal`].
    pub async fn exec(&self, addr: &WorkerAddr, req: &TaskRequest) -> Result<String, DispatchError> {
        match AssertUnwindSafe(self.dispatch(addr, req)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(target: "cronx.dispatch", %addr, task_id = req.id, panic = %message, "dispatch panicked");
                Err(DispatchError::Internal(message))
            }
        }
    }

    async fn dispatch(&self, addr: &WorkerAddr, req: &TaskRequest) -> Result<String, DispatchError> {
        let timeout = req.timeout();

        let mut client = match self.pool.get(addr).await {
            Ok(client) => client,
            Err(e) => {
                warn!(target: "cronx.dispatch", %addr, task_id = req.id, error = %e, "worker unavailable");
                return Err(e.into());
            }
        };

        let registration = self.registry.scoped(TaskKey::new(addr, req.id));
        info!(
            target: "cronx.dispatch",
            key = %registration.key(),
            timeout_s = timeout.secs(),
            kind = req.kind.kind(),
            "dispatch start"
        );

        let mut request = tonic::Request::new(proto::TaskRequest::from(req));
        request.set_timeout(timeout.as_duration());

        let result = tokio::select! {
            biased;
            _ = registration.handle().cancelled() => Err(DispatchError::Cancelled),
            res = tokio::time::timeout(timeout.as_duration(), client.run(request)) => match res {
                Err(_) => Err(DispatchError::TimedOut),
                Ok(Err(status)) => Err(DispatchError::from_status(status)),
                Ok(Ok(resp)) => {
                    let resp = resp.into_inner();
                    if resp.error.is_empty() {
                        Ok(resp.output)
                    } else {
                        Err(DispatchError::Logical {
                            message: resp.error,
                            output: resp.output,
                        })
                    }
                }
            },
        };

        match &result {
            Ok(output) => info!(
                target: "cronx.dispatch",
                key = %registration.key(),
                bytes = output.len(),
                "dispatch finished"
            ),
            Err(e) => {
                if e.kind() == FailureKind::RemoteUnavailable {
                    self.pool.evict(addr);
                }
                info!(
                    target: "cronx.dispatch",
                    key = %registration.key(),
                    kind = ?e.kind(),
                    error = %e,
                    "dispatch failed"
                );
            }
        }
        result
    }

    /// Stop the run of `task_log_id` on `addr`.
    ///
    /// Fires the cancel handle of a matching in-flight [`Dispatcher::exec`]
    /// if there is one; otherwise marks the task log cancelled through the
    /// orphan reconciler. Never fails.
    pub async fn stop(&self, addr: &WorkerAddr, task_log_id: TaskLogId) -> StopOutcome {
        let key = TaskKey::new(addr, task_log_id);
        match self.registry.lookup(&key) {
            Some(handle) => {
                info!(target: "cronx.dispatch", %key, "stop requested");
                handle.cancel();
                StopOutcome::Signalled
            }
            None => {
                warn!(target: "cronx.dispatch", %key, "no in-flight dispatch; reconciling task log");
                StopOutcome::Reconciled(self.reconciler.reconcile(task_log_id).await)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
