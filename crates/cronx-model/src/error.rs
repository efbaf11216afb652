use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid worker address: {0} (expected host:port)")]
    InvalidAddr(String),

    #[error("invalid port in worker address: {0}")]
    InvalidPort(String),

    #[error("unknown http method: {0}")]
    UnknownHttpMethod(String),
}
