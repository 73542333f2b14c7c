//! Probe paths, probe handlers and shutdown timing

use super::error::ServerError;
use super::health::{Probe, ReadinessFlag};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default readiness probe path
pub const DEFAULT_READY_PATH: &str = "/ready";

/// Default liveness probe path
pub const DEFAULT_ALIVE_PATH: &str = "/health";

/// Default time to report not-ready before the listener closes
pub const DEFAULT_WAIT_BEFORE_SHUTDOWN: Duration = Duration::from_secs(15);

/// Default time given to in-flight requests once the listener closes
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const ENV_READY_PATH: &str = "READYLIVE_READY_PATH";
const ENV_ALIVE_PATH: &str = "READYLIVE_ALIVE_PATH";
const ENV_WAIT_BEFORE_SHUTDOWN: &str = "READYLIVE_WAIT_BEFORE_SHUTDOWN_SECS";
const ENV_SHUTDOWN_TIMEOUT: &str = "READYLIVE_SHUTDOWN_TIMEOUT_SECS";

/// Configuration of a wrapped server
///
/// Built with the `with_*` methods and handed to [`Server::wrap`](super::Server::wrap),
/// after which it is no longer mutable.
#[derive(Clone)]
pub struct ServerConfig {
    pub(crate) ready_path: String,
    pub(crate) ready: Arc<dyn Probe>,
    pub(crate) alive_path: String,
    pub(crate) alive: Arc<dyn Probe>,
    pub(crate) wait_before_shutdown: Duration,
    pub(crate) shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Set the readiness probe path
    pub fn with_ready_path(mut self, path: impl Into<String>) -> Self {
        self.ready_path = path.into();
        self
    }

    /// Replace the readiness handler
    ///
    /// If the handler exposes [`SetReady`](super::SetReady), shutdown flips it
    /// to not-ready before draining.
    pub fn with_ready_handler(mut self, handler: impl Probe) -> Self {
        self.ready = Arc::new(handler);
        self
    }

    /// Set the liveness probe path
    pub fn with_alive_path(mut self, path: impl Into<String>) -> Self {
        self.alive_path = path.into();
        self
    }

    /// Replace the liveness handler
    pub fn with_alive_handler(mut self, handler: impl Probe) -> Self {
        self.alive = Arc::new(handler);
        self
    }

    /// How long the server keeps serving while reporting not-ready
    pub fn with_wait_before_shutdown(mut self, wait: Duration) -> Self {
        self.wait_before_shutdown = wait;
        self
    }

    /// How long in-flight requests get to finish.
    ///
    /// Counted from the end of the wait-before-shutdown period.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn ready_path(&self) -> &str {
        &self.ready_path
    }

    pub fn alive_path(&self) -> &str {
        &self.alive_path
    }

    pub fn wait_before_shutdown(&self) -> Duration {
        self.wait_before_shutdown
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Load configuration from `READYLIVE_*` environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_READY_PATH) {
            config.ready_path = parse_path(ENV_READY_PATH, path)?;
        }
        if let Some(path) = lookup(ENV_ALIVE_PATH) {
            config.alive_path = parse_path(ENV_ALIVE_PATH, path)?;
        }
        if let Some(secs) = lookup(ENV_WAIT_BEFORE_SHUTDOWN) {
            config.wait_before_shutdown = parse_secs(ENV_WAIT_BEFORE_SHUTDOWN, secs)?;
        }
        if let Some(secs) = lookup(ENV_SHUTDOWN_TIMEOUT) {
            config.shutdown_timeout = parse_secs(ENV_SHUTDOWN_TIMEOUT, secs)?;
        }

        Ok(config)
    }
}

fn invalid(key: &str, value: String) -> ServerError {
    ServerError::InvalidConfig {
        key: key.to_string(),
        value,
    }
}

fn parse_path(key: &str, value: String) -> Result<String, ServerError> {
    if is_literal_path(&value) {
        Ok(value)
    } else {
        Err(invalid(key, value))
    }
}

/// Whether `path` can be mounted as a literal probe path
///
/// Probe paths match exactly, so anything the router would read as a
/// capture or wildcard (`{..}`, `:name`, `*rest`) is rejected.
pub(crate) fn is_literal_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains(['{', '}'])
        && !path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}

fn parse_secs(key: &str, value: String) -> Result<Duration, ServerError> {
    match value.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(Duration::from_secs_f64(secs)),
        _ => Err(invalid(key, value)),
    }
}

/// Defaults: `/ready` and `/health`, each backed by its own [`ReadinessFlag`]
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ready_path: DEFAULT_READY_PATH.to_string(),
            ready: Arc::new(ReadinessFlag::default()),
            alive_path: DEFAULT_ALIVE_PATH.to_string(),
            alive: Arc::new(ReadinessFlag::default()),
            wait_before_shutdown: DEFAULT_WAIT_BEFORE_SHUTDOWN,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("ready_path", &self.ready_path)
            .field("alive_path", &self.alive_path)
            .field("wait_before_shutdown", &self.wait_before_shutdown)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}
