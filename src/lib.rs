//! Readiness and liveness probes with coordinated graceful shutdown
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use readylive::server::{AxumServer, Server, ServerConfig};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), readylive::server::ServerError> {
//! let app = Router::new().route("/", get(|| async { "hello" }));
//! let config = ServerConfig::default().with_wait_before_shutdown(Duration::from_secs(10));
//! let server = Server::wrap(AxumServer::bind(([0, 0, 0, 0], 8080).into()), app, config);
//!
//! server.listen_and_serve();
//! // ... on SIGTERM:
//! server.shutdown(std::future::pending()).await
//! # }
//! ```

pub mod server;
