use super::health::liveness;
use super::prometheus::publish_prometheus;
use super::state::HttpServerState;
use crate::config::ProxyConfig;
use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{Level, info};

/// Builds the proxy router: `GET /` is the liveness probe, `POST /` the
/// remote write pipeline.
pub fn build_router(state: HttpServerState, config: &ProxyConfig) -> Result<Router> {
    let max_body_layer = DefaultBodyLimit::max(config.parse_http_body_limit()?);

    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    // Middleware creation
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(config.http_server_timeout()))
        .into_inner();

    let app = Router::new()
        .route(
            "/",
            get(liveness)
                .post(publish_prometheus)
                .layer(max_body_layer),
        )
        .layer(middleware)
        .with_state(state);

    Ok(app)
}

/// Serves the proxy on an already bound listener until the shutdown future completes.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

pub async fn run_http_server(
    state: HttpServerState,
    config: &ProxyConfig,
    address: SocketAddr,
) -> Result<()> {
    let app = build_router(state, config)?;

    // Failing to bind is the only fatal condition once configured
    let listener = TcpListener::bind(address).await?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, app, shutdown_signal()).await
}

async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install the CTRL+C signal handler: {}", err);
        std::future::pending::<()>().await;
    }
}
