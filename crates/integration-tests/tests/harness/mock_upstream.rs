//! Mock `OpenAI`-compatible upstream for integration tests
//!
//! Streams canned chat completion chunks and records every request it sees.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// How the mock answers chat requests
#[derive(Debug, Clone, Copy)]
pub enum MockMode {
    /// Stream "Hello from mock" word by word, then stop
    Normal,
    /// Answer every request with 500
    Failing,
    /// Emit a line that is not valid JSON
    Malformed,
}

/// One request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Mock upstream bound to an ephemeral port
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    mode: MockMode,
    request_count: AtomicU32,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockUpstream {
    /// Start a mock that streams a normal completion
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MockMode::Normal).await
    }

    /// Start a mock in the given mode
    pub async fn start_with(mode: MockMode) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            mode,
            request_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL without a path, as Azure resources are configured
    pub fn root_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base URL including `/v1`, as `OpenAI` providers are configured
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// Most recent request, if any
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.requests.lock().unwrap().last().cloned()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    state.request_count.fetch_add(1, Ordering::SeqCst);

    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let model = body["model"].as_str().unwrap_or("unknown").to_owned();

    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        headers,
        body,
    });

    match state.mode {
        MockMode::Normal => event_stream(completion_events(&model)),
        MockMode::Failing => (StatusCode::INTERNAL_SERVER_ERROR, "mock upstream failure").into_response(),
        MockMode::Malformed => event_stream("data: {not json\n\n".to_owned()),
    }
}

fn event_stream(body: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn completion_events(model: &str) -> String {
    let chunk = |delta: Value, finish_reason: Value| {
        json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": model,
            "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
        })
    };

    let mut chunks = vec![chunk(json!({"role": "assistant", "content": ""}), Value::Null)];
    for piece in ["Hello", " from", " mock"] {
        chunks.push(chunk(json!({"content": piece}), Value::Null));
    }
    chunks.push(chunk(json!({}), json!("stop")));

    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}
