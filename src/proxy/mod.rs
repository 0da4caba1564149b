use crate::parsing::prometheus::{
    CodecError, ValidationError, encode_remote_write_request, parse_remote_write_request,
    validate_write_request,
};
use crate::upstream::{UpstreamClient, UpstreamError};
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Runs one remote write through decode, validation and forwarding.
///
/// Holds no per-request state, clones share the upstream connection pool.
#[derive(Clone)]
pub struct RemoteWriteProxy {
    upstream: Arc<dyn UpstreamClient>,
}

impl RemoteWriteProxy {
    pub fn new(upstream: Arc<dyn UpstreamClient>) -> Self {
        Self { upstream }
    }

    /// Processes a compressed write request and returns the upstream's 2xx status.
    ///
    /// The upstream receives the validated request re-encoded, never the
    /// client's bytes. `forwarded_headers` are added to the upstream request
    /// unchanged.
    pub async fn process(
        &self,
        payload: &[u8],
        forwarded_headers: &HeaderMap,
    ) -> Result<StatusCode, ProxyError> {
        let write_request = parse_remote_write_request(payload)?;
        validate_write_request(&write_request)?;

        debug!(
            "Write request: {} timeseries, {} samples, {} metadata",
            write_request.timeseries.len(),
            write_request.samples_count(),
            write_request.metadata.len()
        );

        let compressed = encode_remote_write_request(&write_request)?;
        let status = self
            .upstream
            .send_write_request(compressed.into(), forwarded_headers)
            .await?;

        Ok(status)
    }
}
