use super::ProxyConfig;
use clap::Parser;
use std::net::IpAddr;

/// Prometheus remote write proxy.
///
/// Flags override the values loaded from the environment and `settings.toml`.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Port for serving http
    #[arg(long)]
    pub port: Option<u16>,

    /// Interface for serving http
    #[arg(long)]
    pub endpoint: Option<IpAddr>,

    /// Upstream url of the ingester deployment
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// Max content length allowed to be posted, e.g. 10mb
    #[arg(long)]
    pub http_body_limit: Option<String>,

    /// Seconds to wait for the upstream response
    #[arg(long)]
    pub upstream_timeout_seconds: Option<u64>,
}

impl Cli {
    pub fn apply(self, mut config: ProxyConfig) -> ProxyConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(upstream_url) = self.upstream_url {
            config.upstream_url = upstream_url;
        }
        if let Some(http_body_limit) = self.http_body_limit {
            config.http_body_limit = http_body_limit;
        }
        if let Some(upstream_timeout_seconds) = self.upstream_timeout_seconds {
            config.upstream_timeout_seconds = upstream_timeout_seconds;
        }
        config
    }
}
