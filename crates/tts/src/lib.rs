#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Text-to-speech proxy returning float sample arrays

mod error;
mod http_client;
mod pcm;
mod provider;
mod request;
mod server;
mod types;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};

pub use error::{Result, TtsError};
pub use pcm::decode_s16le;
pub use request::RequestContext;
pub use server::{Server, TtsServerBuilder};
pub use types::{Synthesis, SynthesisRequest, SynthesisResponse};
use request::ExtractPayload;

/// Build the TTS server from configuration
pub fn build_server(config: &clipdeck_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        TtsServerBuilder::new(&config.tts)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize TTS server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for TTS
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new().route("/tts", post(synthesize))
}

/// Handle speech synthesis requests
async fn synthesize(
    State(server): State<Arc<Server>>,
    ExtractPayload(context, request): ExtractPayload<SynthesisRequest>,
) -> Result<Json<SynthesisResponse>> {
    tracing::debug!("TTS handler called for model: {:?}", request.model);

    let synthesis = server.synthesize(request, &context).await?;

    tracing::debug!("Speech synthesis complete, {} samples", synthesis.samples.len());

    Ok(Json(synthesis.into()))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use clipdeck_config::{TtsConfig, TtsProviderConfig, TtsProviderType};
    use http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    use super::*;

    fn router(base_url: &str) -> Router {
        let mut config = TtsConfig::default();
        config.providers.insert(
            "kokoro".to_string(),
            TtsProviderConfig {
                provider_type: TtsProviderType::OpenaiTts,
                api_key: None,
                base_url: Some(base_url.to_string()),
                model: None,
                sample_rate: 24_000,
            },
        );

        let server = Arc::new(TtsServerBuilder::new(&config).build().unwrap());
        endpoint_router().with_state(server)
    }

    async fn post_json(router: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::post("/tts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn returns_audio_array() {
        let upstream = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(body_partial_json(json!({"voice": "bm_george", "speed": 1.5, "model": "kokoro"})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x00, 0x40, 0x00, 0x00]))
            .expect(1)
            .mount(&upstream)
            .await;

        let (status, body) = post_json(router(&upstream.uri()), json!({"text": "Hello", "speed": 1.5})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "ok", "audio_array": [0.5, 0.0], "sample_rate": 24000})
        );
    }

    #[tokio::test]
    async fn missing_text_is_bad_request() {
        let (status, body) = post_json(router("http://127.0.0.1:9"), json!({"speed": 1.0})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "text is required");
    }

    #[tokio::test]
    async fn empty_audio_is_server_error() {
        let upstream = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&upstream)
            .await;

        let (status, body) = post_json(router(&upstream.uri()), json!({"text": "..."})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "No audio generated");
    }

    #[tokio::test]
    async fn unknown_provider_prefix() {
        let (status, body) = post_json(
            router("http://127.0.0.1:9"),
            json!({"text": "hi", "model": "nope/tts-1"}),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["type"], "not_found_error");
    }

    #[tokio::test]
    async fn wrong_content_type_is_rejected() {
        let request = Request::post("/tts")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("text=hi"))
            .unwrap();

        let response = router("http://127.0.0.1:9").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
