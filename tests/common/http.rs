/// HTTP testing utilities
use anyhow::Result;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use remote_write_proxy::config::ProxyConfig;
use remote_write_proxy::http::server::build_router;
use remote_write_proxy::http::state::HttpServerState;
use remote_write_proxy::proxy::RemoteWriteProxy;
use remote_write_proxy::test_utils::test_config;
use remote_write_proxy::upstream::ReqwestUpstreamClient;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot` and `ready`

/// HTTP test client driving the proxy router in process
#[derive(Clone)]
pub struct TestApp {
    app: axum::Router,
}

impl TestApp {
    /// Create a new test app forwarding to `upstream_url`
    pub fn new(upstream_url: &str) -> Self {
        Self::with_config(test_config(upstream_url), None)
    }

    /// Create a test app with an upstream timeout shorter than a second
    pub fn with_upstream_timeout(upstream_url: &str, timeout: Duration) -> Self {
        Self::with_config(test_config(upstream_url), Some(timeout))
    }

    pub fn with_config(config: ProxyConfig, upstream_timeout: Option<Duration>) -> Self {
        let mut upstream = ReqwestUpstreamClient::new(&config).unwrap();
        if let Some(timeout) = upstream_timeout {
            upstream = upstream.with_timeout(timeout);
        }
        let state = HttpServerState {
            proxy: RemoteWriteProxy::new(Arc::new(upstream)),
        };
        let app = build_router(state, &config).unwrap();
        Self { app }
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }

    /// Send a bare POST request, without any header, like most simple clients
    pub async fn post(&self, path: &str, data: &[u8]) -> Result<TestResponse> {
        self.post_with_headers(path, data, &[]).await
    }

    /// Send a POST request with only the given headers
    pub async fn post_with_headers(
        &self,
        path: &str,
        data: &[u8],
        headers: &[(&str, &str)],
    ) -> Result<TestResponse> {
        let mut request = Request::builder().method("POST").uri(path);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let request = request.body(Body::from(data.to_vec()))?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }

    /// Send a Prometheus remote write request (compressed protobuf)
    pub async fn post_remote_write(&self, compressed_data: &[u8]) -> Result<TestResponse> {
        self.post_remote_write_with_headers(compressed_data, &[])
            .await
    }

    pub async fn post_remote_write_with_headers(
        &self,
        compressed_data: &[u8],
        extra_headers: &[(&str, &str)],
    ) -> Result<TestResponse> {
        let mut request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/x-protobuf")
            .header("content-encoding", "snappy")
            .header("x-prometheus-remote-write-version", "0.1.0");
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }
        let request = request.body(Body::from(compressed_data.to_vec()))?;

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }
}

/// Test response wrapper for easier assertions
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default()
            .to_vec();
        let body = String::from_utf8_lossy(&body_bytes).to_string();

        Self {
            status,
            headers,
            body,
        }
    }

    /// Get response status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get response body as string
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}. Body: {}",
            expected, self.status, self.body
        );
        self
    }

    /// Assert response body contains text
    pub fn assert_body_contains(&self, text: &str) -> &Self {
        assert!(
            self.body.contains(text),
            "Expected body to contain '{}', but body was: {}",
            text,
            self.body
        );
        self
    }
}
