use anyhow::{Error, bail};
use confique::Config;
use crate::upstream::RETRY_MAX_INTERVAL;
use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};
use url::Url;

pub mod cli;

#[derive(Debug, Clone, Config)]
pub struct ProxyConfig {
    #[config(env = "PROXY_PORT", default = 19093)]
    pub port: u16,
    #[config(env = "PROXY_ENDPOINT", default = "127.0.0.1")]
    pub endpoint: IpAddr,

    /// Where the write requests are forwarded, usually a Cortex or Mimir distributor.
    #[config(env = "PROXY_UPSTREAM_URL", default = "http://127.0.0.1:5000")]
    pub upstream_url: String,

    #[config(env = "PROXY_HTTP_BODY_LIMIT", default = "100MiB")]
    pub http_body_limit: String,

    #[config(env = "PROXY_HTTP_SERVER_TIMEOUT_SECONDS", default = 60)]
    pub http_server_timeout_seconds: u64,

    #[config(env = "PROXY_UPSTREAM_TIMEOUT_SECONDS", default = 30)]
    pub upstream_timeout_seconds: u64,

    #[config(env = "PROXY_UPSTREAM_CONNECT_TIMEOUT_MS", default = 1000)]
    pub upstream_connect_timeout_ms: u64,

    #[config(env = "PROXY_UPSTREAM_POOL_MAX_IDLE_PER_HOST", default = 64)]
    pub upstream_pool_max_idle_per_host: usize,

    /// Retries of retryable upstream failures. Zero means a single attempt.
    #[config(env = "PROXY_UPSTREAM_MAX_RETRIES", default = 0)]
    pub upstream_max_retries: u32,

    #[config(env = "PROXY_USER_AGENT")]
    pub user_agent: Option<String>,

    #[config(env = "PROXY_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl ProxyConfig {
    pub fn load() -> Result<ProxyConfig, Error> {
        let c = ProxyConfig::builder()
            .env()
            .file("settings.toml")
            .load()?;

        Ok(c)
    }

    /// Checks the values that confique cannot check on its own.
    pub fn validate(&self) -> Result<(), Error> {
        self.parse_upstream_url()?;
        self.parse_http_body_limit()?;
        if self.upstream_timeout_seconds == 0 {
            bail!("The upstream timeout must be at least one second");
        }
        if self.http_server_timeout_seconds == 0 {
            bail!("The HTTP server timeout must be at least one second");
        }
        // Otherwise a slow upstream is reported as 408 by the server instead of 504
        match self.upstream_deadline() {
            Some(deadline) if self.http_server_timeout() > deadline => Ok(()),
            Some(deadline) => bail!(
                "The HTTP server timeout ({:?}) must be longer than the upstream deadline ({:?})",
                self.http_server_timeout(),
                deadline
            ),
            None => bail!("The upstream timeout and retries are too large"),
        }
    }

    /// Longest time a write can wait on the upstream: every attempt timing
    /// out, with the longest backoff between attempts.
    pub fn upstream_deadline(&self) -> Option<Duration> {
        let attempts = self.upstream_max_retries.checked_add(1)?;
        let waiting = self.upstream_timeout().checked_mul(attempts)?;
        let sleeping = RETRY_MAX_INTERVAL.checked_mul(self.upstream_max_retries)?;
        waiting.checked_add(sleeping)
    }

    pub fn parse_http_body_limit(&self) -> Result<usize, Error> {
        let size = byte_unit::Byte::parse_str(self.http_body_limit.clone(), true)?.as_u64();
        if size > 128 * 1024 * 1024 * 1024 {
            bail!("Body size is too big: > 128GB");
        }
        Ok(size as usize)
    }

    pub fn parse_upstream_url(&self) -> Result<Url, Error> {
        let url = Url::parse(&self.upstream_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => bail!("Unsupported upstream scheme {}, must be http or https", scheme),
        }
    }

    pub fn listen_address(&self) -> SocketAddr {
        SocketAddr::from((self.endpoint, self.port))
    }

    pub fn http_server_timeout(&self) -> Duration {
        Duration::from_secs(self.http_server_timeout_seconds)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }

    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_connect_timeout_ms)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("remote-write-proxy/{}", env!("CARGO_PKG_VERSION")))
    }
}
