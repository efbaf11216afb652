use cronx_model::{TaskKind, TaskRequest};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    config::{HttpConfig, ShellConfig},
    error::ExecError,
    http::HttpExecutor,
    output::RunOutput,
    shell::ShellExecutor,
};

/// Routes a [`TaskRequest`] to the executor for its kind.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    shell: ShellExecutor,
    http: HttpExecutor,
}

impl TaskExecutor {
    pub fn new(shell: ShellConfig, http: HttpConfig) -> Result<Self, ExecError> {
        Ok(Self {
            shell: ShellExecutor::new(shell),
            http: HttpExecutor::new(http)?,
        })
    }

    /// Run `req` until it finishes, its execution timeout elapses or `cancel` fires.
    #[instrument(level = "debug", skip(self, req, cancel), fields(task_id = req.id, kind = req.kind.kind()))]
    pub async fn run(&self, req: &TaskRequest, cancel: &CancellationToken) -> RunOutput {
        let timeout = req.exec_timeout().as_duration();
        match req.kind {
            TaskKind::Shell => self.shell.run(&req.command, cancel, timeout).await,
            TaskKind::Http { method } => self.http.run(&req.command, method, cancel, timeout).await,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shell_requests_go_to_the_shell() {
        let exec = TaskExecutor::new(ShellConfig::default(), HttpConfig::default()).unwrap();
        let req = TaskRequest::shell(1, "echo routed", 5);
        let out = exec.run(&req, &CancellationToken::new()).await;
        assert!(out.is_success());
        assert_eq!(out.output, "routed\n");
    }

    #[tokio::test]
    async fn http_requests_go_to_the_http_client() {
        let exec = TaskExecutor::new(ShellConfig::default(), HttpConfig::default()).unwrap();
        // Nothing listens on port 1.
        let req = TaskRequest::http(2, "http://127.0.0.1:1/", cronx_model::HttpMethod::Get, 5);
        let out = exec.run(&req, &CancellationToken::new()).await;
        assert!(matches!(out.error, Some(ExecError::Http(_))), "{out:?}");
    }
}
