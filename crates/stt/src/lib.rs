#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Speech-to-text proxy taking float sample arrays

mod audio;
mod error;
mod http_client;
mod provider;
mod request;
mod server;
mod types;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};

pub use audio::{TARGET_SAMPLE_RATE, encode_wav, resample_linear};
pub use error::{Result, SttError};
pub use request::RequestContext;
pub use server::{Server, SttServerBuilder};
pub use types::{Segment, Transcript, TranscriptionRequest, TranscriptionResponse, Word};
use request::ExtractPayload;

/// Build the STT server from configuration
pub fn build_server(config: &clipdeck_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        SttServerBuilder::new(&config.stt)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize STT server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for STT
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new().route("/asr", post(transcribe))
}

/// Handle transcription requests
async fn transcribe(
    State(server): State<Arc<Server>>,
    ExtractPayload(context, request): ExtractPayload<TranscriptionRequest>,
) -> Result<Json<TranscriptionResponse>> {
    tracing::debug!("ASR handler called for model: {:?}", request.model);

    let transcript = server.transcribe(request, &context).await?;

    tracing::debug!("Transcription complete, {} characters", transcript.text.len());

    Ok(Json(transcript.into()))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use clipdeck_config::{SttConfig, SttProviderConfig, SttProviderType};
    use http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header as header_eq, method, path},
    };

    use super::*;

    fn router(base_url: &str) -> Router {
        let mut config = SttConfig::default();
        config.providers.insert(
            "whisper".to_string(),
            SttProviderConfig {
                provider_type: SttProviderType::Whisper,
                api_key: None,
                base_url: Some(base_url.to_string()),
                model: Some("small".to_string()),
            },
        );

        let server = Arc::new(SttServerBuilder::new(&config).build().unwrap());
        endpoint_router().with_state(server)
    }

    async fn post_json(router: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::post("/asr")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn returns_text_and_segments() {
        let upstream = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "Hello.",
                "segments": [{"id": 0, "start": 0.0, "end": 0.5, "text": "Hello."}]
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let (status, body) = post_json(
            router(&upstream.uri()),
            json!({"audio_array": [0.0, 0.25, -0.25, 0.0], "sample_rate": 24000}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "ok",
                "text": "Hello.",
                "segments": [{"id": 0, "start": 0.0, "end": 0.5, "text": "Hello."}]
            })
        );
    }

    #[tokio::test]
    async fn missing_audio_is_bad_request() {
        let (status, body) = post_json(router("http://127.0.0.1:9"), json!({"sample_rate": 16000})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "audio_array is required");
    }

    #[tokio::test]
    async fn unreachable_provider_is_bad_gateway() {
        let (status, body) = post_json(router("http://127.0.0.1:9"), json!({"audio_array": [0.1]})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn caller_key_header_is_forwarded() {
        let upstream = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header_eq("authorization", "Bearer caller-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "ok", "segments": []})))
            .expect(1)
            .mount(&upstream)
            .await;

        let request = Request::post("/asr")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Provider-API-Key", "caller-key")
            .body(Body::from(json!({"audio_array": [0.1, -0.1]}).to_string()))
            .unwrap();

        let response = router(&upstream.uri()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
