use thiserror::Error;

/// Failure to hand out a channel for a worker address.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("invalid worker endpoint {addr}: {reason}")]
    InvalidEndpoint { addr: String, reason: String },

    #[error("cannot connect to worker {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },
}

/// A request that cannot be mapped onto the domain model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown task protocol: {0}")]
    UnknownProtocol(i32),

    #[error("unknown http method: {0}")]
    UnknownHttpMethod(i32),
}

impl From<WireError> for tonic::Status {
    fn from(err: WireError) -> Self {
        tonic::Status::invalid_argument(err.to_string())
    }
}

#[cfg(feature = "server")]
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid worker config: {0}")]
    InvalidConfig(String),

    #[error("executor setup failed: {0}")]
    Exec(#[from] cronx_exec::ExecError),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}
