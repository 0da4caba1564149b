use super::{app_error::AppError, state::HttpServerState};
use crate::upstream::HEADER_NAME_SCOPE_ORG_ID;
use axum::{
    debug_handler,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tokio_util::bytes::Bytes;
use tracing::debug;

/// Checks the Prometheus Remote Write headers that are present.
///
/// Plain clients often post the compressed body without any header, so
/// missing headers are accepted. Present ones must match the protocol:
/// - `content-encoding`: "snappy"
/// - `content-type`: "application/x-protobuf"
/// - `x-prometheus-remote-write-version`: a 0.1 version
fn verify_headers(headers: &HeaderMap) -> Result<(), AppError> {
    if let Some(content_encoding) = headers.get("content-encoding") {
        match content_encoding.to_str() {
            Ok(value) if value.eq_ignore_ascii_case("snappy") => {}
            _ => {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Unsupported content-encoding, must be snappy"
                )));
            }
        }
    }

    if let Some(content_type) = headers.get("content-type") {
        match content_type.to_str() {
            Ok(value) if value.eq_ignore_ascii_case("application/x-protobuf") => {}
            _ => {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Unsupported content-type, must be application/x-protobuf"
                )));
            }
        }
    }

    if let Some(version) = headers.get("x-prometheus-remote-write-version") {
        match version.to_str() {
            Ok(value) if value.starts_with("0.1") => {}
            _ => {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Unsupported x-prometheus-remote-write-version, must be 0.1.x"
                )));
            }
        }
    }

    Ok(())
}

/// Headers copied unchanged onto the upstream request.
fn forwarded_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    if let Some(tenant) = headers.get(HEADER_NAME_SCOPE_ORG_ID) {
        forwarded.insert(HEADER_NAME_SCOPE_ORG_ID, tenant.clone());
    }
    forwarded
}

/// Prometheus Remote Write API.
///
/// Decodes and validates the write request, then forwards it to the
/// upstream ingester. Any 2xx from the upstream is answered with 200 and an
/// empty body, failures carry the upstream status.
#[debug_handler]
pub async fn publish_prometheus(
    State(state): State<HttpServerState>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Result<StatusCode, AppError> {
    debug!("Prometheus remote write: received {} bytes", bytes.len());

    verify_headers(&headers)?;

    let upstream_status = state
        .proxy
        .process(&bytes, &forwarded_headers(&headers))
        .await?;
    debug!("Upstream accepted the write with {}", upstream_status);

    Ok(StatusCode::OK)
}
