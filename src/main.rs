use axum::{routing::get, Router};
use readylive::server::{
    grace_cutoff, wait_for_signal, AxumServer, Phase, Server, ServerConfig,
};
use std::net::SocketAddr;
use tracing::{error, info, warn};

/// Default listen address
const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Get listen address from env (default: 0.0.0.0:8080)
fn get_listen_addr() -> anyhow::Result<SocketAddr> {
    let raw = std::env::var("READYLIVE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid READYLIVE_ADDR {:?}: {}", raw, e))
}

async fn hello() -> &'static str {
    "Hello from readylive\n"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = get_listen_addr()?;
    let config = ServerConfig::from_env()?;
    info!(
        addr = %addr,
        ready_path = config.ready_path(),
        alive_path = config.alive_path(),
        wait_before_shutdown = ?config.wait_before_shutdown(),
        shutdown_timeout = ?config.shutdown_timeout(),
        "Starting readylive demo server"
    );

    let app = Router::new().route("/", get(hello));
    let server = Server::wrap(AxumServer::bind(addr), app, config);
    server.listen_and_serve();

    // Stop early if the listener dies before any signal arrives
    let mut phases = server.subscribe();
    tokio::select! {
        signal = wait_for_signal() => {
            let signal = signal?;
            info!(signal = %signal, "Initiating graceful shutdown");
        }
        _ = phases.wait_for(|p| *p == Phase::FailedToStart) => {
            warn!("Listener failed before shutdown was requested");
        }
    }

    // A second signal skips whatever is left of the grace period
    let (cutoff, mut cutoff_signal) = grace_cutoff();
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(_) => cutoff.cut(),
            Err(e) => {
                error!(error = %e, "Failed to wait for second signal");
                std::future::pending::<()>().await;
            }
        }
    });

    match server.shutdown(cutoff_signal.wait()).await {
        Ok(()) => {
            info!("readylive demo server shut down gracefully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Shutdown failed");
            Err(e.into())
        }
    }
}
