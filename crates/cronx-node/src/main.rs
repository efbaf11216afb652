use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use clap::Parser;
use cronx_exec::ShellConfig;
use cronx_observe::{LoggerConfig, logger_init};
use cronx_rpc::{WorkerConfig, serve};
use tracing::info;

mod shutdown;

/// Worker daemon: executes tasks dispatched by a cronx master.
#[derive(Parser, Debug)]
#[command(name = "cronx-node", version)]
struct Args {
    /// Address the gRPC worker service binds to.
    #[arg(long, env = "CRONX_NODE_LISTEN", default_value = "0.0.0.0:5921")]
    listen: SocketAddr,

    /// Log filter directive, e.g. `info` or `cronx=debug,tonic=warn`.
    #[arg(long, env = "CRONX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// text | json | journald
    #[arg(long, env = "CRONX_LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// Wait after the graceful terminate before killing the process tree.
    #[arg(long, env = "CRONX_GRACE_MS", default_value_t = 2000)]
    grace_ms: u64,
}

impl Args {
    fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            listen: self.listen,
            shell: ShellConfig {
                grace_period: Duration::from_millis(self.grace_ms),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_cfg = LoggerConfig::from_parts(&args.log_format, args.log_level.as_str())
        .context("invalid logger settings")?;
    logger_init(&log_cfg).context("logger init")?;

    let cfg = args.worker_config();
    info!(
        target: "cronx.node",
        listen = %cfg.listen,
        grace_ms = args.grace_ms,
        "starting worker node"
    );

    let shutdown = shutdown::install_shutdown_handler();
    serve(cfg, shutdown).await.context("worker service failed")?;

    info!(target: "cronx.node", "bye");
    Ok(())
}
