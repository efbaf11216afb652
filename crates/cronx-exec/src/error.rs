use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("empty command")]
    EmptyCommand,
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("exit status {code}")]
    NonZeroExit { code: i32 },
    #[error("killed by signal")]
    KilledBySignal,
    #[error("io error: {0}")]
    Io(String),
    /// Deadline hit; the process (tree) was terminated.
    #[error("timeout killed")]
    TimeoutKilled,
    /// Cancellation requested; the process (tree) was terminated.
    #[error("cancelled")]
    Cancelled,
    #[error("request timed out")]
    TimedOut,
    #[error("http request failed: {0}")]
    Http(String),
    #[error("http status is not 200: {code}")]
    HttpStatus { code: u16 },
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}
