//! The HTTP server underneath the coordinator
//!
//! [`HttpServer`] is the contract the coordinator drives; [`AxumServer`] is
//! the production implementation built on `axum-server`.

use super::error::ServerError;
use async_trait::async_trait;
use axum::Router;
use axum_server::Handle;
use std::net::SocketAddr;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

/// Server primitives needed to coordinate a graceful shutdown
#[async_trait]
pub trait HttpServer: Send + Sync + 'static {
    /// Serve `app` until the server stops
    ///
    /// Returns `Ok(())` when closed by [`shutdown`](Self::shutdown) or
    /// [`force_close`](Self::force_close), an error if it could not start or
    /// failed while running.
    async fn listen(&self, app: Router) -> Result<(), ServerError>;

    /// Stop accepting connections and wait for in-flight requests
    ///
    /// Must return [`ServerError::DeadlineExceeded`] if requests are still
    /// running at `deadline`.
    async fn shutdown(&self, deadline: Instant) -> Result<(), ServerError>;

    /// Close the listener and every connection without waiting
    async fn force_close(&self) -> Result<(), ServerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServeState {
    Idle,
    Listening,
    Stopped,
}

/// Plain HTTP server on a socket address
pub struct AxumServer {
    addr: SocketAddr,
    handle: Handle,
    state: watch::Sender<ServeState>,
}

impl AxumServer {
    /// Create a server for `addr`; nothing is bound until `listen`
    pub fn bind(addr: SocketAddr) -> Self {
        let (state, _) = watch::channel(ServeState::Idle);
        Self {
            addr,
            handle: Handle::new(),
            state,
        }
    }

    /// Address actually bound, once listening
    ///
    /// Resolves to `None` if binding failed. Waits until `listen` has been
    /// called and the socket is bound, so port 0 can be resolved here.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.listening().await
    }

    /// Number of open connections
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }
}

#[async_trait]
impl HttpServer for AxumServer {
    async fn listen(&self, app: Router) -> Result<(), ServerError> {
        self.state.send_replace(ServeState::Listening);
        info!(addr = %self.addr, "HTTP server starting");

        let result = axum_server::bind(self.addr)
            .handle(self.handle.clone())
            .serve(app.into_make_service())
            .await;

        self.state.send_replace(ServeState::Stopped);
        match &result {
            Ok(()) => info!(addr = %self.addr, "HTTP server stopped"),
            Err(e) => warn!(addr = %self.addr, error = %e, "HTTP server failed"),
        }
        result.map_err(ServerError::from)
    }

    async fn shutdown(&self, deadline: Instant) -> Result<(), ServerError> {
        // The handle remembers the request, so a listen that has not started
        // yet stops as soon as it binds.
        self.handle.graceful_shutdown(None);

        let mut state = self.state.subscribe();
        if *state.borrow() == ServeState::Idle {
            return Ok(());
        }

        let stopped = async {
            state
                .wait_for(|s| *s == ServeState::Stopped)
                .await
                .map(|_| ())
        };
        match tokio::time::timeout_at(deadline, stopped).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ServerError::ListenerLost),
            Err(_) => Err(ServerError::DeadlineExceeded),
        }
    }

    async fn force_close(&self) -> Result<(), ServerError> {
        info!(
            addr = %self.addr,
            connections = self.handle.connection_count(),
            "Force closing HTTP server"
        );
        self.handle.shutdown();
        Ok(())
    }
}
