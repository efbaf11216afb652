use cronx_rpc::PoolError;
use thiserror::Error;
use tonic::{Code, Status};

/// Coarse classification of a failed dispatch, for callers that branch on
/// the kind of failure rather than on its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    RemoteUnavailable,
    TimedOut,
    Cancelled,
    Unclassified,
    Logical,
    Internal,
}

/// Failure channel of [`crate::Dispatcher::exec`].
///
/// Transport-level failures (`Connect`, `Unavailable`, `TimedOut`,
/// `Cancelled`, `Unclassified`) mean the worker never produced a response.
/// `Logical` means it did, and the command reported an error; its partial
/// output is kept.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("cannot connect to worker: {0}")]
    Connect(#[from] PoolError),

    #[error("cannot connect to worker: {0}")]
    Unavailable(String),

    #[error("execution timed out, forcibly ended")]
    TimedOut,

    #[error("manually stopped")]
    Cancelled,

    #[error("{message}")]
    Unclassified { code: Code, message: String },

    #[error("{message}")]
    Logical { message: String, output: String },

    #[error("internal dispatch fault: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::Connect(_) | DispatchError::Unavailable(_) => {
                FailureKind::RemoteUnavailable
            }
            DispatchError::TimedOut => FailureKind::TimedOut,
            DispatchError::Cancelled => FailureKind::Cancelled,
            DispatchError::Unclassified { .. } => FailureKind::Unclassified,
            DispatchError::Logical { .. } => FailureKind::Logical,
            DispatchError::Internal(_) => FailureKind::Internal,
        }
    }

    /// Output produced before the failure. Only logical failures carry any.
    pub fn output(&self) -> &str {
        match self {
            DispatchError::Logical { output, .. } => output,
            _ => "",
        }
    }

    pub fn is_transport(&self) -> bool {
        !matches!(
            self.kind(),
            FailureKind::Logical | FailureKind::Internal
        )
    }

    /// Map a failed call status onto the classification table.
    pub fn from_status(status: Status) -> Self {
        match status.code() {
            Code::Unavailable => DispatchError::Unavailable(status.message().to_string()),
            Code::DeadlineExceeded => DispatchError::TimedOut,
            Code::Cancelled => DispatchError::Cancelled,
            code => DispatchError::Unclassified {
                code,
                message: status.message().to_string(),
            },
        }
    }
}

impl From<Status> for DispatchError {
    fn from(status: Status) -> Self {
        DispatchError::from_status(status)
    }
}
