use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::bytes::Bytes;

/// A write as seen by the fake upstream.
#[derive(Debug, Clone)]
pub struct ReceivedWrite {
    pub headers: HeaderMap,
    pub body: Bytes,
}

struct FakeUpstreamState {
    status: AtomicU16,
    // true while responses are withheld
    gate: watch::Sender<bool>,
    received: Mutex<Vec<ReceivedWrite>>,
    received_count: watch::Sender<usize>,
}

/// Upstream ingester double listening on an ephemeral local port.
///
/// Every POST is read in full and recorded before the response is written.
/// While held, the response is withheld until [`FakeUpstream::release`] is
/// called.
pub struct FakeUpstream {
    address: SocketAddr,
    state: Arc<FakeUpstreamState>,
    handle: JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(FakeUpstreamState {
            status: AtomicU16::new(StatusCode::OK.as_u16()),
            gate: watch::channel(false).0,
            received: Mutex::new(Vec::new()),
            received_count: watch::channel(0).0,
        });

        let app = Router::new()
            .route("/", post(receive_write))
            .route("/{*path}", post(receive_write))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            address,
            state,
            handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.address)
    }

    pub fn set_status(&self, status: StatusCode) {
        self.state.status.store(status.as_u16(), Ordering::SeqCst);
    }

    /// Withholds responses until [`FakeUpstream::release`] is called.
    pub fn hold(&self) {
        self.state.gate.send_replace(true);
    }

    /// Writes every withheld response, and the next ones immediately.
    pub fn release(&self) {
        self.state.gate.send_replace(false);
    }

    pub fn received(&self) -> Vec<ReceivedWrite> {
        self.state
            .received
            .lock()
            .expect("received writes lock poisoned")
            .clone()
    }

    /// Waits until at least `count` request bodies have been fully read.
    pub async fn wait_for_requests(&self, count: usize) {
        let mut receiver = self.state.received_count.subscribe();
        let _ = receiver.wait_for(|received| *received >= count).await;
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn receive_write(
    State(state): State<Arc<FakeUpstreamState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state
        .received
        .lock()
        .expect("received writes lock poisoned")
        .push(ReceivedWrite { headers, body });
    state.received_count.send_modify(|count| *count += 1);

    let mut gate = state.gate.subscribe();
    let _ = gate.wait_for(|held| !*held).await;

    let status =
        StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK);
    if status.is_redirection() {
        return (status, [(header::LOCATION, "/redirected")]).into_response();
    }
    status.into_response()
}
