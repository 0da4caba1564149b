pub mod reqwest_client;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio_util::bytes::Bytes;

pub use reqwest_client::ReqwestUpstreamClient;

pub const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";
pub const HEADER_NAME_REMOTE_WRITE_VERSION: &str = "X-Prometheus-Remote-Write-Version";
pub const REMOTE_WRITE_VERSION_01: &str = "0.1.0";
/// Longest wait between two attempts when retries are enabled.
pub const RETRY_MAX_INTERVAL: Duration = Duration::from_secs(5);
/// Tenant header understood by Cortex and Mimir, forwarded untouched.
pub const HEADER_NAME_SCOPE_ORG_ID: &str = "X-Scope-OrgID";

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("upstream rejected the write with {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Sends compressed write requests to the upstream ingester.
///
/// `Ok` always carries a 2xx status, redirects are not followed.
/// Implementations must not share a connection between two in-flight
/// requests.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send_write_request(
        &self,
        compressed_write_request: Bytes,
        extra_headers: &HeaderMap,
    ) -> Result<StatusCode>;
}

/// Whether a failed forward is worth another attempt.
///
/// Writes are idempotent at the ingester, so resending the same payload is safe.
#[must_use]
pub fn should_retry(e: &UpstreamError) -> bool {
    match e {
        UpstreamError::Rejected { status, .. } => {
            status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
        }
        UpstreamError::Unavailable(_) | UpstreamError::Timeout(_) => true,
    }
}
