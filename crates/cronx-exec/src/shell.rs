use std::{process::ExitStatus, process::Stdio, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Child,
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    config::ShellConfig,
    encoding::decode_output,
    error::ExecError,
    html::clean_html_entities,
    output::RunOutput,
    util::{
        default_work_dir, isolate_process_tree, kill_leftovers, kill_tree, shell_command,
        terminate_graceful,
    },
};

const READ_CHUNK: usize = 1024;

/// Runs one command line through the platform shell.
///
/// stdout and stderr are captured into one buffer as they arrive. On
/// deadline or cancellation the process group gets a graceful terminate;
/// if it is still alive after [`ShellConfig::grace_period`] the whole tree
/// is killed. Either way the readers are drained first, so output printed
/// before termination is returned next to the failure.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    cfg: ShellConfig,
}

enum Interrupt {
    Deadline,
    Cancelled,
}

impl From<Interrupt> for ExecError {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Deadline => ExecError::TimeoutKilled,
            Interrupt::Cancelled => ExecError::Cancelled,
        }
    }
}

impl ShellExecutor {
    pub fn new(cfg: ShellConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.cfg
    }

    pub async fn run(
        &self,
        command: &str,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> RunOutput {
        let command = clean_html_entities(command);
        if command.trim().is_empty() {
            return RunOutput::failed(String::new(), ExecError::EmptyCommand);
        }

        let work_dir = self.cfg.work_dir.clone().unwrap_or_else(default_work_dir);

        let mut cmd = shell_command(&command);
        cmd.current_dir(&work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        isolate_process_tree(&mut cmd);

        trace!(target: "cronx.exec.shell", command = %command, dir = %work_dir.display(), "spawn");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(target: "cronx.exec.shell", error = %e, "spawn failed");
                return RunOutput::failed(String::new(), ExecError::Spawn(e.to_string()));
            }
        };

        let pid = child.id();
        let deadline = Instant::now() + timeout;
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let readers: Vec<JoinHandle<()>> = [
            child.stdout.take().map(|s| capture(s, Arc::clone(&buffer))),
            child.stderr.take().map(|s| capture(s, Arc::clone(&buffer))),
        ]
        .into_iter()
        .flatten()
        .collect();

        let finished = tokio::select! {
            status = child.wait() => Ok(status),
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = sleep_until(deadline) => Err(Interrupt::Deadline),
        };

        let mut error = match finished {
            Ok(Ok(status)) => exit_error(status),
            Ok(Err(e)) => Some(ExecError::from(e)),
            Err(interrupt) => {
                self.terminate(&mut child).await;
                Some(interrupt.into())
            }
        };

        // Background jobs may outlive the shell and keep the pipes open, so
        // draining stays bound by the same deadline and cancellation.
        let drain = drain(readers);
        tokio::pin!(drain);
        let late = tokio::select! {
            biased;
            _ = &mut drain => None,
            _ = cancel.cancelled() => Some(Interrupt::Cancelled),
            _ = sleep_until(deadline) => Some(Interrupt::Deadline),
        };
        if let Some(interrupt) = late {
            debug!(target: "cronx.exec.shell", pid = ?pid, "output still open; killing leftover processes");
            if let Some(pid) = pid {
                kill_leftovers(pid);
            }
            if tokio::time::timeout(self.cfg.grace_period, &mut drain)
                .await
                .is_err()
            {
                warn!(target: "cronx.exec.shell", pid = ?pid, "output pipes still held open; returning partial output");
            }
            error = error.or(Some(interrupt.into()));
        }

        let bytes = std::mem::take(&mut *buffer.lock().await);
        let output = decode_output(bytes, self.cfg.encoding);

        match &error {
            None => debug!(target: "cronx.exec.shell", bytes = output.len(), "exit success"),
            Some(e) => debug!(target: "cronx.exec.shell", error = %e, bytes = output.len(), "exit failure"),
        }
        RunOutput { output, error }
    }

    async fn terminate(&self, child: &mut Child) {
        let pid = child.id();
        debug!(target: "cronx.exec.shell", pid = ?pid, "interrupted; terminating process group");
        terminate_graceful(child).await;

        if tokio::time::timeout(self.cfg.grace_period, child.wait())
            .await
            .is_ok()
        {
            // The leader is gone; stragglers would keep the pipes open.
            if let Some(pid) = pid {
                kill_leftovers(pid);
            }
        } else {
            warn!(
                target: "cronx.exec.shell",
                pid = ?child.id(),
                grace_ms = self.cfg.grace_period.as_millis() as u64,
                "grace period exceeded; killing process tree"
            );
            kill_tree(child).await;
            let _ = child.wait().await;
        }
    }
}

fn capture<R>(mut stream: R, buffer: Arc<Mutex<Vec<u8>>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buffer.lock().await.extend_from_slice(&chunk[..n]),
            }
        }
    })
}

async fn drain(readers: Vec<JoinHandle<()>>) {
    for reader in readers {
        if let Err(e) = reader.await {
            warn!(target: "cronx.exec.shell", error = %e, "output reader failed");
        }
    }
}

fn exit_error(status: ExitStatus) -> Option<ExecError> {
    if status.success() {
        return None;
    }
    match status.code() {
        Some(code) => Some(ExecError::NonZeroExit { code }),
        None => Some(ExecError::KilledBySignal),
    }
}
