//! Mounts the probe handlers in front of the application router

use super::config::{is_literal_path, ServerConfig};
use super::error::ServerError;
use super::health::Probe;
use axum::{extract::Request, routing::any, Router};
use std::sync::Arc;
use tracing::{debug, warn};

/// Build the router installed in place of the application router
///
/// - readiness path -> readiness handler
/// - liveness path -> liveness handler
/// - everything else -> `app`, unchanged
///
/// Probe paths are literal. Paths with captures or wildcards are rejected
/// with [`ServerError::InvalidConfig`]. Paths are not checked against each
/// other or against `app`'s routes.
/// When both probe paths are equal the liveness handler is the one mounted,
/// and probe paths always shadow application routes with the same path.
pub fn build_router(config: &ServerConfig, app: Router) -> Result<Router, ServerError> {
    let mut probes: Vec<(&str, Arc<dyn Probe>)> = Vec::with_capacity(2);

    for (key, path, probe) in [
        ("ready_path", config.ready_path.as_str(), &config.ready),
        ("alive_path", config.alive_path.as_str(), &config.alive),
    ] {
        if !is_literal_path(path) {
            return Err(ServerError::InvalidConfig {
                key: key.to_string(),
                value: path.to_string(),
            });
        }

        match probes.iter_mut().find(|(existing, _)| *existing == path) {
            Some(slot) => {
                warn!(path = %path, "Probe paths collide, last registration wins");
                slot.1 = Arc::clone(probe);
            }
            None => probes.push((path, Arc::clone(probe))),
        }
    }

    let router: Router = probes
        .into_iter()
        .fold(Router::new(), |router, (path, probe)| {
            debug!(path = %path, "Mounting probe handler");
            router.route(
                path,
                any(move |request: Request| {
                    let probe = Arc::clone(&probe);
                    async move { probe.check(request).await }
                }),
            )
        });

    Ok(router.fallback_service(app))
}
