use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ModelError, log::TaskLogId};

/// Network location of a worker node (`host:port`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerAddr {
    pub host: String,
    pub port: u16,
}

impl WorkerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// URI used to open a plaintext gRPC channel to the worker.
    pub fn endpoint_uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for WorkerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for WorkerAddr {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| ModelError::InvalidAddr(s.to_string()))?;
        if host.is_empty() {
            return Err(ModelError::InvalidAddr(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ModelError::InvalidPort(s.to_string()))?;
        Ok(WorkerAddr::new(host, port))
    }
}

/// Lookup key of one in-flight dispatch: `host:port:task_log_id`.
///
/// The same task log id sent to two different workers yields two different
/// keys, so concurrent retries on other nodes never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(addr: &WorkerAddr, id: TaskLogId) -> Self {
        TaskKey(format!("{}:{}:{}", addr.host, addr.port, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaskKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
