//! Master <-> worker wire contract.
//!
//! * [`proto`]: generated tonic/prost types for the `cronx.v1.Worker` service.
//! * [`ChannelPool`]: cached channels to workers, behind the [`ConnectionPool`] seam.
//! * `server` feature: [`WorkerService`], the worker-side implementation.

pub mod proto {
    tonic::include_proto!("cronx.v1");
}
pub use proto::worker_client::WorkerClient;
#[cfg(feature = "server")]
pub use proto::worker_server::WorkerServer;

mod convert;

mod error;
pub use error::{PoolError, WireError};

mod pool;
pub use pool::{ChannelPool, ConnectionPool, PoolConfig};

#[cfg(feature = "server")]
mod server;
#[cfg(feature = "server")]
pub use error::ServeError;
#[cfg(feature = "server")]
pub use server::{WorkerConfig, WorkerService, serve};

pub use tonic;
