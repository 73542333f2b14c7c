//! HTTP server wrapper with Kubernetes-style probes
//!
//! Adds two probe endpoints in front of an application router:
//! - `/ready` - Readiness probe (should this instance receive traffic?)
//! - `/health` - Liveness probe (is the process alive?)
//!
//! and a shutdown sequence that reports not-ready, waits for load balancers
//! to notice, drains in-flight requests and force closes stragglers.

mod config;
mod coordinator;
mod error;
mod health;
mod listener;
mod router;
pub mod signal;

pub use config::{
    ServerConfig, DEFAULT_ALIVE_PATH, DEFAULT_READY_PATH, DEFAULT_SHUTDOWN_TIMEOUT,
    DEFAULT_WAIT_BEFORE_SHUTDOWN,
};
pub use coordinator::{Phase, Server};
pub use error::ServerError;
pub use health::{Probe, ReadinessFlag, SetReady};
pub use listener::{AxumServer, HttpServer};
pub use router::build_router;
pub use signal::{grace_cutoff, wait_for_signal, CutoffSignal, GraceCutoff, TerminationSignal};

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_tests;

#[cfg(test)]
#[path = "router_test.rs"]
mod router_tests;

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_tests;

#[cfg(test)]
#[path = "listener_test.rs"]
mod listener_tests;

#[cfg(test)]
#[path = "signal_test.rs"]
mod signal_tests;
