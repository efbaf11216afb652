//! Domain types shared by the cronx master and its workers.
//!
//! Nothing in here talks to the network or spawns processes: the crate only
//! describes *what* is dispatched (`TaskRequest`), *where* (`WorkerAddr`), how
//! an in-flight run is identified (`TaskKey`) and how the persisted task log
//! is patched (`TaskLogUpdate`).

mod addr;
pub use addr::{TaskKey, WorkerAddr};

mod error;
pub use error::ModelError;

mod log;
pub use log::{TaskLog, TaskLogId, TaskLogStatus, TaskLogUpdate};

mod request;
pub use request::{HttpMethod, TaskKind, TaskRequest};

mod timeout;
pub use timeout::{HTTP_MAX_TIMEOUT_SECS, MAX_TIMEOUT_SECS, Timeout};
