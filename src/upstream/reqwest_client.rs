use super::{
    CONTENT_TYPE_PROTOBUF, HEADER_NAME_REMOTE_WRITE_VERSION, REMOTE_WRITE_VERSION_01,
    RETRY_MAX_INTERVAL, Result, UpstreamClient, UpstreamError, should_retry,
};
use crate::config::ProxyConfig;
use anyhow::Context;
use async_trait::async_trait;
use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;
use tokio_util::bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

/// Longest part of an upstream error body kept in the error message.
const MAX_ERROR_BODY_LEN: usize = 1024;

/// Upstream client backed by a pooled reqwest client.
///
/// The pool hands each request its own connection, a connection is only
/// reused once the previous response has been fully read.
#[derive(Clone)]
pub struct ReqwestUpstreamClient {
    inner: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    max_retries: u32,
}

impl ReqwestUpstreamClient {
    pub fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .connect_timeout(config.upstream_connect_timeout())
            .pool_max_idle_per_host(config.upstream_pool_max_idle_per_host)
            .http1_title_case_headers()
            // A followed 301/302 turns the write into a GET without body
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build the upstream HTTP client")?;

        Ok(Self {
            inner,
            endpoint: config.parse_upstream_url()?,
            timeout: config.upstream_timeout(),
            max_retries: config.upstream_max_retries,
        })
    }

    /// Overrides the bounded wait for an upstream response.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn make_retry_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(50))
            .with_max_interval(RETRY_MAX_INTERVAL)
            // None on overflow, the retry count still bounds the attempts
            .with_max_elapsed_time(
                self.timeout
                    .checked_mul(self.max_retries.saturating_add(1)),
            )
            .build()
    }

    async fn send_once(&self, body: Bytes, extra_headers: &HeaderMap) -> Result<StatusCode> {
        let request = self
            .inner
            .post(self.endpoint.clone())
            .headers(extra_headers.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_PROTOBUF)
            .header(CONTENT_ENCODING, "snappy")
            .header(HEADER_NAME_REMOTE_WRITE_VERSION, REMOTE_WRITE_VERSION_01)
            .body(body);

        // The response body is read under the same deadline so that the
        // connection goes back to the pool in a clean state.
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Err(_) => return Err(UpstreamError::Timeout(self.timeout)),
            Ok(Err(e)) if e.is_timeout() => return Err(UpstreamError::Timeout(self.timeout)),
            Ok(Err(e)) => return Err(UpstreamError::Unavailable(describe(&e))),
            Ok(Ok(exchange)) => exchange,
        };

        if status.is_success() {
            return Ok(status);
        }

        let body = &body[..body.len().min(MAX_ERROR_BODY_LEN)];
        Err(UpstreamError::Rejected {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn send_write_request(
        &self,
        compressed_write_request: Bytes,
        extra_headers: &HeaderMap,
    ) -> Result<StatusCode> {
        let mut backoff = self.make_retry_backoff();
        let mut attempt = 0;
        loop {
            match self
                .send_once(compressed_write_request.clone(), extra_headers)
                .await
            {
                Ok(status) => {
                    debug!(
                        "Forwarded {} bytes to {}: {}",
                        compressed_write_request.len(),
                        self.endpoint,
                        status
                    );
                    return Ok(status);
                }
                Err(e) if attempt < self.max_retries && should_retry(&e) => {
                    let Some(delay) = backoff.next_backoff() else {
                        return Err(e);
                    };
                    attempt += 1;
                    warn!(
                        "Upstream write failed, retry {}/{} in {:?}: {}",
                        attempt, self.max_retries, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// reqwest errors only display their outermost context.
fn describe(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
