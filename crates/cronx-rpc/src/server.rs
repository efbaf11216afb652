use std::net::SocketAddr;

use cronx_exec::{HttpConfig, RunOutput, ShellConfig, TaskExecutor};
use cronx_model::TaskRequest;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, transport::Server};
use tracing::{error, info};

use crate::{
    error::ServeError,
    proto::{self, worker_server::Worker, worker_server::WorkerServer},
};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub listen: SocketAddr,
    pub shell: ShellConfig,
    pub http: HttpConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 5921)),
            shell: ShellConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), ServeError> {
        self.shell.validate().map_err(ServeError::InvalidConfig)?;
        if self.http.max_timeout.is_zero() {
            return Err(ServeError::InvalidConfig("http max timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Worker side of `cronx.v1.Worker`.
///
/// Every call runs on its own tokio task. The handler future holds a drop
/// guard on the run's cancellation token: if the master cancels the call or
/// its deadline passes, tonic drops the handler, the guard fires, and the
/// executor terminates the process tree while the task winds down on its own.
#[derive(Debug, Clone)]
pub struct WorkerService {
    executor: TaskExecutor,
}

impl WorkerService {
    pub fn new(executor: TaskExecutor) -> Self {
        Self { executor }
    }

    pub fn from_config(cfg: &WorkerConfig) -> Result<Self, ServeError> {
        let executor = TaskExecutor::new(cfg.shell.clone(), cfg.http.clone())?;
        Ok(Self::new(executor))
    }

    pub fn into_server(self) -> WorkerServer<Self> {
        WorkerServer::new(self)
    }
}

impl From<RunOutput> for proto::TaskResponse {
    fn from(out: RunOutput) -> Self {
        proto::TaskResponse {
            error: out.error_message(),
            output: out.output,
        }
    }
}

#[tonic::async_trait]
impl Worker for WorkerService {
    async fn run(
        &self,
        request: Request<proto::TaskRequest>,
    ) -> Result<Response<proto::TaskResponse>, Status> {
        let req = TaskRequest::try_from(request.into_inner())?;
        let task_id = req.id;
        info!(
            target: "cronx.rpc.worker",
            task_id,
            kind = req.kind.kind(),
            timeout_s = req.exec_timeout().secs(),
            command = %req.command,
            "execute start"
        );

        let cancel = CancellationToken::new();
        let _abandoned = cancel.clone().drop_guard();

        let executor = self.executor.clone();
        let out = tokio::spawn(async move { executor.run(&req, &cancel).await })
            .await
            .map_err(|e| {
                error!(target: "cronx.rpc.worker", task_id, error = %e, "execution task panicked");
                Status::internal(format!("execution task failed: {e}"))
            })?;

        info!(
            target: "cronx.rpc.worker",
            task_id,
            error = %out.error_message(),
            bytes = out.output.len(),
            "execute end"
        );
        Ok(Response::new(out.into()))
    }
}

/// Serve the worker service on `cfg.listen` until `shutdown` is cancelled.
pub async fn serve(cfg: WorkerConfig, shutdown: CancellationToken) -> Result<(), ServeError> {
    cfg.validate()?;
    let service = WorkerService::from_config(&cfg)?;

    info!(target: "cronx.rpc.worker", addr = %cfg.listen, "worker listening");
    Server::builder()
        .add_service(service.into_server())
        .serve_with_shutdown(cfg.listen, async move { shutdown.cancelled().await })
        .await?;
    info!(target: "cronx.rpc.worker", "worker stopped");
    Ok(())
}
