use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use cronx_model::TaskKey;
use dashmap::DashMap;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, warn};

/// Capability to stop one in-flight dispatch.
///
/// Cloning shares the same underlying signal. Once cancelled it stays
/// cancelled.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    id: u64,
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`CancelHandle::cancel`] has been called.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    fn same_as(&self, other: &CancelHandle) -> bool {
        self.id == other.id
    }
}

/// Concurrent map from [`TaskKey`] to the [`CancelHandle`] of the dispatch
/// currently running under that key.
///
/// Cheap to clone; clones share the same map. All operations are safe from
/// any number of tasks without external locking.
#[derive(Debug, Clone, Default)]
pub struct CancelRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: DashMap<TaskKey, CancelHandle>,
    next_id: AtomicU64,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh, unregistered handle.
    pub fn new_handle(&self) -> CancelHandle {
        CancelHandle {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        }
    }

    /// Insert `handle` under `key`, returning the handle it replaced.
    ///
    /// Replacing a live entry is allowed but logged: two concurrent runs
    /// under one key means the caller reused a (worker, task log) pair.
    pub fn register(&self, key: TaskKey, handle: CancelHandle) -> Option<CancelHandle> {
        let previous = self.inner.entries.insert(key.clone(), handle);
        match &previous {
            Some(_) => warn!(target: "cronx.registry", %key, "replaced live cancel handle"),
            None => debug!(target: "cronx.registry", %key, "cancel handle registered"),
        }
        previous
    }

    pub fn lookup(&self, key: &TaskKey) -> Option<CancelHandle> {
        self.inner.entries.get(key).map(|h| h.value().clone())
    }

    /// Remove whatever is registered under `key`. Removing twice is a no-op.
    pub fn remove(&self, key: &TaskKey) -> Option<CancelHandle> {
        self.inner.entries.remove(key).map(|(_, handle)| handle)
    }

    /// Remove `key` only while it still maps to `handle`.
    fn remove_exact(&self, key: &TaskKey, handle: &CancelHandle) -> bool {
        self.inner
            .entries
            .remove_if(key, |_, current| current.same_as(handle))
            .is_some()
    }

    /// Register a new handle under `key` for the lifetime of the returned guard.
    pub fn scoped(&self, key: TaskKey) -> Registration {
        let handle = self.new_handle();
        self.register(key.clone(), handle.clone());
        Registration {
            registry: self.clone(),
            key,
            handle,
        }
    }

    pub fn contains(&self, key: &TaskKey) -> bool {
        self.inner.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Snapshot of the keys currently registered.
    pub fn keys(&self) -> Vec<TaskKey> {
        self.inner.entries.iter().map(|e| e.key().clone()).collect()
    }
}

/// Scoped registration returned by [`CancelRegistry::scoped`].
///
/// Dropping it (normal return, `?`, unwinding) removes the entry, unless
/// another registration has replaced it in the meantime.
#[derive(Debug)]
pub struct Registration {
    registry: CancelRegistry,
    key: TaskKey,
    handle: CancelHandle,
}

impl Registration {
    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    pub fn handle(&self) -> &CancelHandle {
        &self.handle
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.remove_exact(&self.key, &self.handle) {
            debug!(target: "cronx.registry", key = %self.key, "cancel handle removed");
        }
    }
}
