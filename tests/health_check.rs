mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::http::TestApp;
use remote_write_proxy::test_utils::{FakeUpstream, unused_local_url};

mod health_check_tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness_endpoint() -> Result<()> {
        // Given: A proxy with a healthy upstream
        let upstream = FakeUpstream::start().await?;
        let app = TestApp::new(&upstream.url());

        // When: We query the liveness endpoint
        let response = app.get("/").await?;

        // Then: Response should be the fixed liveness body
        response.assert_status(StatusCode::OK);
        assert_eq!(response.body(), "Up\n");

        // And the upstream is never contacted
        assert!(upstream.received().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_liveness_is_independent_of_upstream_state() -> Result<()> {
        // Given: A proxy whose upstream does not exist
        let app = TestApp::new(&unused_local_url().await);

        // When: We query the liveness endpoint multiple times
        for _ in 0..3 {
            let response = app.get("/").await?;
            // Then: It always reports the process as up
            response.assert_status(StatusCode::OK);
            assert_eq!(response.body(), "Up\n");
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_liveness_while_upstream_is_held() -> Result<()> {
        // Given: A proxy whose upstream withholds every response
        let upstream = FakeUpstream::start().await?;
        upstream.hold();
        let app = TestApp::new(&upstream.url());

        let pending = {
            let app = app.clone();
            let payload = common::fixtures::compressed(&common::fixtures::tenant_metric(
                "1",
                "testmetric",
                400.0,
            ));
            tokio::spawn(async move { app.post_remote_write(&payload).await })
        };
        upstream.wait_for_requests(1).await;

        // When: We query the liveness endpoint
        let response = app.get("/").await?;

        // Then: It answers without waiting for the held write
        response.assert_status(StatusCode::OK);
        assert!(!pending.is_finished());

        upstream.release();
        pending.await??.assert_status(StatusCode::OK);

        Ok(())
    }
}
