use axum::http::StatusCode;
use axum::response::IntoResponse;

pub const LIVENESS_BODY: &str = "Up\n";

/// Liveness check
///
/// Always returns 200 OK if the server is able to respond, whatever the
/// state of the upstream.
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, LIVENESS_BODY)
}
