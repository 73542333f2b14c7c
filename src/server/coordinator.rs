//! Shutdown coordination for a wrapped HTTP server
//!
//! Shutdown runs in this order:
//! 1. Readiness flips to not-ready (when the handler supports it)
//! 2. The server keeps serving for the wait-before-shutdown period, or until
//!    the caller's deadline fires, so load balancers notice the flip
//! 3. Graceful shutdown gets the shutdown timeout to drain in-flight requests
//! 4. Anything still running after that is force closed
//!
//! If the listener has already stopped (typically because it never bound),
//! shutdown returns its result instead.

use super::config::ServerConfig;
use super::error::ServerError;
use super::listener::HttpServer;
use super::router::build_router;
use axum::Router;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

type ListenResult = Result<(), ServerError>;

/// Where a wrapped server is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Wrapped, `listen_and_serve` not called yet
    Idle,
    /// Listener task running
    Serving,
    /// Shutdown called, readiness reported false
    DrainingAnnounced,
    /// Waiting out the grace period
    DrainingGrace,
    /// Graceful shutdown in progress, force close if it overruns
    Closing,
    Closed,
    /// The listener reported an error before closing started, either on
    /// its own while serving or during the grace period race
    FailedToStart,
}

/// HTTP server wrapped with readiness/liveness probes and graceful shutdown
pub struct Server<S> {
    server: Arc<S>,
    config: ServerConfig,
    app: Mutex<Option<Router>>,
    result: Mutex<Option<oneshot::Receiver<ListenResult>>>,
    phase: Arc<watch::Sender<Phase>>,
}

impl<S: HttpServer> Server<S> {
    /// Attach probe handlers to `server`, with `app` serving every other path
    ///
    /// Once wrapped, `server` is driven only through the returned handle.
    pub fn wrap(server: S, app: Router, config: ServerConfig) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            server: Arc::new(server),
            config,
            app: Mutex::new(Some(app)),
            result: Mutex::new(None),
            phase: Arc::new(phase),
        }
    }

    /// Start serving in a background task
    ///
    /// Probe routes are installed here. Start-up failures are reported by
    /// the next [`shutdown`](Self::shutdown). Only the first call has an
    /// effect.
    pub fn listen_and_serve(&self) {
        let Some(app) = self.app.lock().unwrap_or_else(PoisonError::into_inner).take() else {
            warn!("listen_and_serve called more than once, ignoring");
            return;
        };

        let (tx, rx) = oneshot::channel();
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Some(rx);

        let router = build_router(&self.config, app);
        let server = Arc::clone(&self.server);
        let phase = Arc::clone(&self.phase);
        self.advance(Phase::Serving);

        tokio::spawn(async move {
            let result = match router {
                Ok(router) => server.listen(router).await,
                Err(e) => Err(e),
            };
            let failed = match &result {
                Ok(()) => false,
                Err(e) => {
                    error!(error = %e, "Listener stopped with an error");
                    true
                }
            };
            // Receiver is gone if shutdown already finished
            let _ = tx.send(result);

            // FailedToStart implies the result is already in the channel
            if failed {
                phase.send_if_modified(|current| {
                    let serving = *current == Phase::Serving;
                    if serving {
                        *current = Phase::FailedToStart;
                    }
                    serving
                });
            }
        });
    }

    /// Shut the server down gracefully
    ///
    /// `deadline` cuts the grace period short when it completes first; pass
    /// `std::future::pending()` to always wait the full period. The drain
    /// that follows has its own bound, so `deadline` never aborts it.
    pub async fn shutdown<F>(&self, deadline: F) -> ListenResult
    where
        F: Future<Output = ()>,
    {
        let mut listener = self
            .result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        // Listener already finished: nothing to drain
        if let Some(rx) = listener.as_mut() {
            match rx.try_recv() {
                Ok(result) => return self.finish_early(result),
                Err(oneshot::error::TryRecvError::Closed) => {
                    return self.finish_early(Err(ServerError::ListenerLost))
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }

        match self.config.ready.as_settable() {
            Some(ready) => {
                ready.set_ready(false);
                info!(path = %self.config.ready_path, "Readiness set to not ready");
            }
            None => debug!("Readiness handler has no SetReady capability, skipping"),
        }
        self.advance(Phase::DrainingAnnounced);

        let listener_done = async move {
            match listener {
                Some(rx) => rx.await.unwrap_or(Err(ServerError::ListenerLost)),
                None => std::future::pending().await,
            }
        };

        self.advance(Phase::DrainingGrace);
        tokio::select! {
            result = listener_done => {
                info!("Listener stopped during grace period");
                return self.finish_early(result);
            }
            _ = tokio::time::sleep(self.config.wait_before_shutdown) => {
                info!(
                    wait = ?self.config.wait_before_shutdown,
                    "Grace period elapsed"
                );
            }
            _ = deadline => {
                info!("Grace period cut short by caller deadline");
            }
        }

        self.advance(Phase::Closing);
        let bound = Instant::now() + self.config.shutdown_timeout;
        let result = match self.server.shutdown(bound).await {
            Err(e) if e.is_deadline_exceeded() => {
                warn!(
                    timeout = ?self.config.shutdown_timeout,
                    "In-flight requests did not finish in time, force closing"
                );
                self.server.force_close().await
            }
            other => other,
        };

        self.advance(Phase::Closed);
        result
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver notified on every phase change
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The wrapped server
    pub fn inner(&self) -> &S {
        &self.server
    }

    fn finish_early(&self, result: ListenResult) -> ListenResult {
        match &result {
            Ok(()) => self.advance(Phase::Closed),
            Err(_) => self.advance(Phase::FailedToStart),
        }
        result
    }

    fn advance(&self, phase: Phase) {
        debug!(phase = ?phase, "Server phase changed");
        self.phase.send_replace(phase);
    }
}
