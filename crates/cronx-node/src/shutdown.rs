use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancel the returned token on the first SIGINT or SIGTERM.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(target: "cronx.node", error = %e, "cannot install SIGTERM handler; Ctrl-C only");
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!(target: "cronx.node", "received SIGTERM, shutting down"),
        _ = ctrl_c() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(target: "cronx.node", "received SIGINT, shutting down"),
        Err(e) => {
            warn!(target: "cronx.node", error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await
        }
    }
}
