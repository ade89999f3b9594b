//! Mock upstream standing in for the speech backends and the upload service
//!
//! Serves an OpenAI-compatible `/v1/audio/*` API plus ingest and publish
//! routes whose answers follow a [`PublishScenario`].

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing,
};
use bytes::Bytes;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;

/// How the publish routes answer
#[derive(Debug, Clone, Copy)]
pub enum PublishScenario {
    /// Every publish attempt confirms with a zero status code
    Confirmed,
    /// Every publish attempt answers 200 with a non-JSON body
    Ambiguous,
    /// JSON attempts complain about the URL, the form fallback is refused
    EndpointMismatch,
    /// JSON attempts complain about the URL, the form fallback is accepted
    FormOnly,
}

pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    scenario: PublishScenario,
    speech_count: AtomicU32,
    transcription_count: AtomicU32,
    ingest_count: AtomicU32,
    publish_count: AtomicU32,
}

impl MockUpstream {
    /// Start the mock with confirming publish routes
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(PublishScenario::Confirmed).await
    }

    pub async fn start_with(scenario: PublishScenario) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            scenario,
            speech_count: AtomicU32::new(0),
            transcription_count: AtomicU32::new(0),
            ingest_count: AtomicU32::new(0),
            publish_count: AtomicU32::new(0),
        });

        let app = Router::new()
            .route("/v1/audio/speech", routing::post(handle_speech))
            .route("/v1/audio/transcriptions", routing::post(handle_transcription))
            .route("/ingest/{name}", routing::post(handle_ingest))
            .route("/publish/{name}", routing::post(handle_publish))
            .with_state(Arc::clone(&state));

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

    /// Base URL for the speech providers, including `/v1`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://{}{path}", self.addr)).expect("mock URL is valid")
    }

    pub fn speech_count(&self) -> u32 {
        self.state.speech_count.load(Ordering::Relaxed)
    }

    pub fn transcription_count(&self) -> u32 {
        self.state.transcription_count.load(Ordering::Relaxed)
    }

    pub fn ingest_count(&self) -> u32 {
        self.state.ingest_count.load(Ordering::Relaxed)
    }

    pub fn publish_count(&self) -> u32 {
        self.state.publish_count.load(Ordering::Relaxed)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Two samples: 0.5 and -0.5 as little-endian 16-bit PCM
async fn handle_speech(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> impl IntoResponse {
    state.speech_count.fetch_add(1, Ordering::Relaxed);

    if body["response_format"] != "pcm" {
        return (StatusCode::BAD_REQUEST, Bytes::from_static(b"pcm only")).into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/pcm")],
        Bytes::from_static(&[0x00, 0x40, 0x00, 0xc0]),
    )
        .into_response()
}

async fn handle_transcription(State(state): State<Arc<MockState>>, body: Bytes) -> impl IntoResponse {
    state.transcription_count.fetch_add(1, Ordering::Relaxed);

    if !body.windows(4).any(|window| window == b"RIFF") {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "expected a WAV file"})));
    }

    (
        StatusCode::OK,
        Json(json!({
            "text": " Hello from the mock.",
            "segments": [
                {"id": 0, "start": 0.0, "end": 1.0, "text": " Hello from the mock."}
            ],
            "words": [
                {"word": "Hello", "start": 0.0, "end": 0.3},
                {"word": "from", "start": 0.3, "end": 0.5},
                {"word": "the", "start": 0.5, "end": 0.6},
                {"word": "mock.", "start": 0.6, "end": 1.0}
            ]
        })),
    )
}

/// The primary endpoint answers with HTML, the secondary with an identifier
async fn handle_ingest(
    State(state): State<Arc<MockState>>,
    Path(name): Path<String>,
    _body: Bytes,
) -> impl IntoResponse {
    state.ingest_count.fetch_add(1, Ordering::Relaxed);

    if name == "primary" {
        return (StatusCode::OK, "<html>login</html>").into_response();
    }

    Json(json!({"data": {"video_id": "7301", "video_key": "key-7301"}})).into_response()
}

async fn handle_publish(State(state): State<Arc<MockState>>, headers: HeaderMap, _body: Bytes) -> impl IntoResponse {
    state.publish_count.fetch_add(1, Ordering::Relaxed);

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    match (state.scenario, is_form) {
        (PublishScenario::Confirmed, _) => {
            Json(json!({"status_code": 0, "data": {"video": {"id": "7301"}}})).into_response()
        }
        (PublishScenario::Ambiguous, _) => (StatusCode::OK, "<html>ok</html>").into_response(),
        (PublishScenario::EndpointMismatch, true) => StatusCode::FORBIDDEN.into_response(),
        (PublishScenario::FormOnly, true) => (StatusCode::OK, "accepted").into_response(),
        (PublishScenario::EndpointMismatch | PublishScenario::FormOnly, false) => {
            Json(json!({"status_msg": "Invalid url"})).into_response()
        }
    }
}
