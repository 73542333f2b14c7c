//! Error type shared by the coordinator and the HTTP server collaborator

use thiserror::Error;

/// Errors surfaced by [`Server`](super::Server) and [`HttpServer`](super::HttpServer)
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Graceful shutdown did not finish before its deadline.
    ///
    /// The coordinator recovers from this one by force-closing the server.
    #[error("Graceful shutdown deadline exceeded")]
    DeadlineExceeded,

    #[error("Listener task ended without reporting a result")]
    ListenerLost,

    #[error("Invalid configuration value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },

    #[error("{0}")]
    Other(String),
}

impl ServerError {
    /// Whether this is the deadline-exceeded condition from a bounded shutdown
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ServerError::DeadlineExceeded)
    }
}
