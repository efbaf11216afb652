//! Master-side dispatch core.
//!
//! [`Dispatcher::exec`] runs one task on a worker and classifies the result;
//! [`Dispatcher::stop`] cancels a matching in-flight `exec`, or, when the
//! master no longer knows about the run (typically after a restart), marks
//! the task log as cancelled through the [`OrphanReconciler`].

mod config;
pub use config::DispatcherConfig;

mod dispatcher;
pub use dispatcher::{Dispatcher, StopOutcome};

mod error;
pub use error::{DispatchError, FailureKind};

mod reconcile;
pub use reconcile::{ORPHAN_RESULT, OrphanReconciler, ReconcileOutcome, ReconcilePolicy};

mod registry;
pub use registry::{CancelHandle, CancelRegistry, Registration};

mod store;
pub use store::{MemoryTaskLogStore, StoreError, TaskLogStore};
