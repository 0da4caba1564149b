use crate::proxy::ProxyError;
use crate::upstream::UpstreamError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;
use tracing::{error, warn};

// Anyhow error handling with axum
// https://github.com/tokio-rs/axum/blob/d3112a40d55f123bc5e65f995e2068e245f12055/examples/anyhow-error-response/src/main.rs
#[derive(Debug)]
pub enum AppError {
    BadRequest(anyhow::Error),
    /// The upstream answered with a 4xx or 5xx status, relayed as is.
    UpstreamRejected(StatusCode, anyhow::Error),
    BadGateway(anyhow::Error),
    GatewayTimeout(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(error) => (StatusCode::BAD_REQUEST, error.to_string()),
            AppError::UpstreamRejected(status, error) => {
                warn!("Upstream rejected a write: {}", error);
                (status, error.to_string())
            }
            AppError::BadGateway(error) => {
                error!("Upstream unavailable: {}", error);
                (StatusCode::BAD_GATEWAY, error.to_string())
            }
            AppError::GatewayTimeout(error) => {
                error!("Upstream timeout: {}", error);
                (StatusCode::GATEWAY_TIMEOUT, error.to_string())
            }
        };
        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<ProxyError> for AppError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Codec(error) => Self::BadRequest(error.into()),
            ProxyError::Validation(error) => Self::BadRequest(error.into()),
            ProxyError::Upstream(error) => match error {
                UpstreamError::Rejected { status, .. }
                    if status.is_client_error() || status.is_server_error() =>
                {
                    Self::UpstreamRejected(status, error.into())
                }
                // Informational and redirect answers mean nothing to a remote write client
                UpstreamError::Rejected { .. } => Self::BadGateway(error.into()),
                UpstreamError::Unavailable(_) => Self::BadGateway(error.into()),
                UpstreamError::Timeout(_) => Self::GatewayTimeout(error.into()),
            },
        }
    }
}

impl AppError {
    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self::BadRequest(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::prometheus::ValidationError;
    use std::time::Duration;

    fn status_of(err: ProxyError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(ProxyError::Validation(ValidationError::EmptyRequest)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ProxyError::Upstream(UpstreamError::Rejected {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: String::new(),
            })),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(ProxyError::Upstream(UpstreamError::Rejected {
                status: StatusCode::MOVED_PERMANENTLY,
                body: String::new(),
            })),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ProxyError::Upstream(UpstreamError::Unavailable(
                "connection refused".to_string()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ProxyError::Upstream(UpstreamError::Timeout(
                Duration::from_secs(1)
            ))),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[tokio::test]
    async fn test_error_body() {
        let response = AppError::bad_request(anyhow::anyhow!("Missing labels")).into_response();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Missing labels"}"#);
    }
}
