use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    log::TaskLogId,
    timeout::{HTTP_MAX_TIMEOUT_SECS, Timeout},
};

/// HTTP verb used by [`TaskKind::Http`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(ModelError::UnknownHttpMethod(s.to_string())),
        }
    }
}

/// How the worker interprets [`TaskRequest::command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    /// Run the command through the platform shell.
    #[default]
    Shell,
    /// Treat the command as a URL and issue a request.
    Http { method: HttpMethod },
}

impl TaskKind {
    /// Short identifier for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskKind::Shell => "shell",
            TaskKind::Http { .. } => "http",
        }
    }
}

/// One task execution handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Task-log row this execution reports into.
    pub id: TaskLogId,
    /// Shell command line, or URL for HTTP tasks.
    pub command: String,
    /// Raw timeout in seconds as configured on the task; see [`TaskRequest::timeout`].
    pub timeout_secs: i64,
    #[serde(default)]
    pub kind: TaskKind,
}

impl TaskRequest {
    pub fn shell(id: TaskLogId, command: impl Into<String>, timeout_secs: i64) -> Self {
        Self {
            id,
            command: command.into(),
            timeout_secs,
            kind: TaskKind::Shell,
        }
    }

    pub fn http(
        id: TaskLogId,
        url: impl Into<String>,
        method: HttpMethod,
        timeout_secs: i64,
    ) -> Self {
        Self {
            id,
            command: url.into(),
            timeout_secs,
            kind: TaskKind::Http { method },
        }
    }

    /// Dispatch timeout, in `(0, 86400]` whatever the kind. This is what the
    /// master waits for and what goes on the wire.
    pub fn timeout(&self) -> Timeout {
        Timeout::normalize(self.timeout_secs)
    }

    /// Timeout the worker applies to the run itself. HTTP tasks are held to
    /// `(0, 300]` on top of the dispatch timeout.
    pub fn exec_timeout(&self) -> Timeout {
        match self.kind {
            TaskKind::Shell => self.timeout(),
            TaskKind::Http { .. } => {
                Timeout::normalize_with_cap(self.timeout_secs, HTTP_MAX_TIMEOUT_SECS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_timeout_is_normalized() {
        assert_eq!(TaskRequest::shell(1, "true", 0).timeout().secs(), 86_400);
        assert_eq!(TaskRequest::shell(1, "true", 30).timeout().secs(), 30);
    }

    #[test]
    fn http_dispatch_timeout_uses_the_day_cap() {
        let zero = TaskRequest::http(1, "http://localhost/", HttpMethod::Get, 0);
        assert_eq!(zero.timeout().secs(), 86_400);

        let long = TaskRequest::http(1, "http://localhost/", HttpMethod::Get, 1_000);
        assert_eq!(long.timeout().secs(), 1_000);
    }

    #[test]
    fn http_exec_timeout_uses_http_cap() {
        let req = TaskRequest::http(1, "http://localhost/", HttpMethod::Get, 3_600);
        assert_eq!(req.exec_timeout().secs(), 300);

        let zero = TaskRequest::http(1, "http://localhost/", HttpMethod::Get, 0);
        assert_eq!(zero.exec_timeout().secs(), 300);

        let short = TaskRequest::http(1, "http://localhost/", HttpMethod::Get, 20);
        assert_eq!(short.exec_timeout().secs(), 20);

        let shell = TaskRequest::shell(1, "true", 3_600);
        assert_eq!(shell.exec_timeout().secs(), 3_600);
    }

    #[test]
    fn http_method_parses_case_insensitively() {
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!(" GET ".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert!("PUT".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn kind_defaults_to_shell_when_missing() {
        let req: TaskRequest =
            serde_json::from_str(r#"{"id":7,"command":"ls","timeout_secs":5}"#).unwrap();
        assert_eq!(req.kind, TaskKind::Shell);
        assert_eq!(req.kind.kind(), "shell");
    }
}
