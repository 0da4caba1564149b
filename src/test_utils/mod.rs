//! Test utilities for the proxy
//!
//! Provides a controllable fake upstream ingester and a configuration
//! builder that does not read the process environment.

pub mod fake_upstream;

pub use fake_upstream::{FakeUpstream, ReceivedWrite};

use crate::config::ProxyConfig;
use std::net::IpAddr;

/// Configuration pointing at `upstream_url`, with the default values and no
/// environment lookup.
pub fn test_config(upstream_url: &str) -> ProxyConfig {
    ProxyConfig {
        port: 0,
        endpoint: IpAddr::from([127, 0, 0, 1]),
        upstream_url: upstream_url.to_string(),
        http_body_limit: "10mb".to_string(),
        http_server_timeout_seconds: 60,
        upstream_timeout_seconds: 30,
        upstream_connect_timeout_ms: 1000,
        upstream_pool_max_idle_per_host: 64,
        upstream_max_retries: 0,
        user_agent: None,
        sentry_dsn: None,
    }
}

/// URL of a local port where nothing listens.
///
/// The port is taken from a listener that is immediately closed, so
/// connections to it are refused.
pub async fn unused_local_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind an ephemeral port");
    let address = listener
        .local_addr()
        .expect("failed to read the ephemeral port");
    drop(listener);
    format!("http://{}/", address)
}
