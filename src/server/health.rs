//! Readiness and liveness probe handlers
//!
//! - [`ReadinessFlag`] - lock-guarded boolean served as 200 / 503
//! - [`Probe`] - contract every probe handler implements
//! - [`SetReady`] - optional capability the coordinator uses to announce draining

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::{Arc, Mutex, PoisonError};

/// Capability of a probe handler that can be told whether it is ready
///
/// The coordinator calls `set_ready(false)` when shutdown begins. Handlers
/// without this capability are left alone.
///
/// The coordinator only finds this capability through
/// [`Probe::as_settable`]. A probe type implementing `SetReady` must
/// override `as_settable` to return `Some(self)`, otherwise it is treated
/// as not settable.
pub trait SetReady: Send + Sync {
    fn set_ready(&self, ready: bool);
}

/// A handler mounted on a probe path
///
/// Implemented by [`ReadinessFlag`] and by any `Fn() -> bool` closure.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Answer a probe request
    async fn check(&self, request: Request) -> Response;

    /// Expose the [`SetReady`] capability, if this handler has one
    ///
    /// Defaults to `None`; implementers of [`SetReady`] return `Some(self)`.
    fn as_settable(&self) -> Option<&dyn SetReady> {
        None
    }
}

fn probe_status(ready: bool) -> StatusCode {
    if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Shared, lock-guarded probe state
///
/// Clones share the same flag. Two flags created separately never affect
/// each other, which is what keeps readiness and liveness independent.
#[derive(Debug, Clone)]
pub struct ReadinessFlag {
    ready: Arc<Mutex<bool>>,
}

impl ReadinessFlag {
    /// Create a flag with the given initial state
    pub fn new(ready: bool) -> Self {
        Self {
            ready: Arc::new(Mutex::new(ready)),
        }
    }

    /// Current state of the flag
    pub fn is_ready(&self) -> bool {
        // A bool cannot be left half-written, so a poisoned lock is still valid
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Flags start out ready
impl Default for ReadinessFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SetReady for ReadinessFlag {
    fn set_ready(&self, ready: bool) {
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner) = ready;
    }
}

#[async_trait]
impl Probe for ReadinessFlag {
    /// Returns 200 OK if ready, 503 Service Unavailable if not. No body.
    async fn check(&self, _request: Request) -> Response {
        probe_status(self.is_ready()).into_response()
    }

    fn as_settable(&self) -> Option<&dyn SetReady> {
        Some(self)
    }
}

/// Closures act as custom probes: `true` is 200, `false` is 503
#[async_trait]
impl<F> Probe for F
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    async fn check(&self, _request: Request) -> Response {
        probe_status(self()).into_response()
    }
}
