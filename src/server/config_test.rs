//! Tests for server configuration

use super::*;
use axum::{body::Body, extract::Request, http::StatusCode};
use std::collections::HashMap;
use std::time::Duration;

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

async fn status_of(probe: &dyn Probe) -> StatusCode {
    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("valid request");
    probe.check(request).await.status()
}

/// Test default paths and timings
#[test]
fn test_defaults() {
    let config = ServerConfig::default();

    assert_eq!(config.ready_path(), "/ready");
    assert_eq!(config.alive_path(), "/health");
    assert_eq!(config.wait_before_shutdown(), Duration::from_secs(15));
    assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
}

/// Test that the default handlers are separate flags
#[tokio::test]
async fn test_default_handlers_are_independent() {
    let config = ServerConfig::default();

    config
        .ready
        .as_settable()
        .expect("default readiness handler is settable")
        .set_ready(false);

    assert_eq!(status_of(config.ready.as_ref()).await, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        status_of(config.alive.as_ref()).await,
        StatusCode::OK,
        "Liveness must not follow readiness"
    );

    // Two configs never share defaults either
    let other = ServerConfig::default();
    assert_eq!(status_of(other.ready.as_ref()).await, StatusCode::OK);
}

/// Test builder overrides
#[tokio::test]
async fn test_builder_overrides() {
    let ready = ReadinessFlag::new(false);
    let config = ServerConfig::default()
        .with_ready_path("/readyz")
        .with_alive_path("/healthz")
        .with_ready_handler(ready.clone())
        .with_alive_handler(|| false)
        .with_wait_before_shutdown(Duration::from_millis(250))
        .with_shutdown_timeout(Duration::from_secs(1));

    assert_eq!(config.ready_path(), "/readyz");
    assert_eq!(config.alive_path(), "/healthz");
    assert_eq!(config.wait_before_shutdown(), Duration::from_millis(250));
    assert_eq!(config.shutdown_timeout(), Duration::from_secs(1));

    assert_eq!(status_of(config.ready.as_ref()).await, StatusCode::SERVICE_UNAVAILABLE);
    ready.set_ready(true);
    assert_eq!(status_of(config.ready.as_ref()).await, StatusCode::OK);

    assert_eq!(status_of(config.alive.as_ref()).await, StatusCode::SERVICE_UNAVAILABLE);
    assert!(config.alive.as_settable().is_none());
}

/// Test loading from environment-style variables
#[test]
fn test_from_lookup_overrides_defaults() {
    let config = ServerConfig::from_lookup(lookup_from(&[
        ("READYLIVE_READY_PATH", "/readyz"),
        ("READYLIVE_ALIVE_PATH", "/livez"),
        ("READYLIVE_WAIT_BEFORE_SHUTDOWN_SECS", "2.5"),
        ("READYLIVE_SHUTDOWN_TIMEOUT_SECS", "30"),
    ]))
    .expect("valid configuration");

    assert_eq!(config.ready_path(), "/readyz");
    assert_eq!(config.alive_path(), "/livez");
    assert_eq!(config.wait_before_shutdown(), Duration::from_millis(2500));
    assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
}

/// Test that unset variables keep defaults
#[test]
fn test_from_lookup_empty_keeps_defaults() {
    let config = ServerConfig::from_lookup(lookup_from(&[])).expect("valid configuration");

    assert_eq!(config.ready_path(), DEFAULT_READY_PATH);
    assert_eq!(config.alive_path(), DEFAULT_ALIVE_PATH);
    assert_eq!(config.wait_before_shutdown(), DEFAULT_WAIT_BEFORE_SHUTDOWN);
    assert_eq!(config.shutdown_timeout(), DEFAULT_SHUTDOWN_TIMEOUT);
}

/// Test that invalid values are reported with their key
#[test]
fn test_from_lookup_rejects_invalid_values() {
    let cases = [
        ("READYLIVE_READY_PATH", "ready"),
        ("READYLIVE_ALIVE_PATH", ""),
        ("READYLIVE_READY_PATH", "/{x}"),
        ("READYLIVE_ALIVE_PATH", "/:health"),
        ("READYLIVE_ALIVE_PATH", "/k8s/*rest"),
        ("READYLIVE_WAIT_BEFORE_SHUTDOWN_SECS", "soon"),
        ("READYLIVE_SHUTDOWN_TIMEOUT_SECS", "-1"),
        ("READYLIVE_SHUTDOWN_TIMEOUT_SECS", "inf"),
    ];

    for (key, value) in cases {
        match ServerConfig::from_lookup(lookup_from(&[(key, value)])) {
            Err(ServerError::InvalidConfig { key: k, value: v }) => {
                assert_eq!(k, key);
                assert_eq!(v, value);
            }
            other => panic!("Expected InvalidConfig for {}={:?}, got {:?}", key, value, other),
        }
    }
}
