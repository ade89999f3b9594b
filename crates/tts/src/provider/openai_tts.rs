use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::{TtsProvider, api_error, effective_key};
use crate::{
    error::TtsError,
    http_client::http_client,
    pcm,
    request::RequestContext,
    types::{SpeechRequest, Synthesis},
};

/// Kokoro-FastAPI listens here by default
const DEFAULT_BASE_URL: &str = "http://localhost:8880/v1";

const DEFAULT_MODEL: &str = "kokoro";

/// OpenAI-compatible `/audio/speech` provider asking for raw PCM
pub struct OpenAiTtsProvider {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    sample_rate: u32,
    name: String,
}

impl OpenAiTtsProvider {
    pub fn new(
        name: String,
        api_key: Option<SecretString>,
        base_url: Option<String>,
        model: Option<String>,
        sample_rate: u32,
    ) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            sample_rate,
            name,
        }
    }
}

#[derive(serde::Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
    speed: f32,
}

#[async_trait]
impl TtsProvider for OpenAiTtsProvider {
    async fn synthesize(&self, request: &SpeechRequest, context: &RequestContext) -> crate::Result<Synthesis> {
        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));
        let model = request.model.as_deref().unwrap_or(&self.model);

        tracing::debug!(
            "OpenAI-compatible TTS request: model={model}, voice={}, speed={}, input_len={}",
            request.voice,
            request.speed,
            request.text.len(),
        );

        let body = SpeechBody {
            model,
            input: &request.text,
            voice: &request.voice,
            response_format: "pcm",
            speed: request.speed,
        };

        let mut builder = self.client.post(&url).json(&body);

        if let Some(key) = effective_key(context, self.api_key.as_ref()) {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("OpenAI-compatible TTS request failed: {e}");
            TtsError::ConnectionError(format!("Failed to send request to {}: {e}", self.name))
        })?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        let audio = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read TTS response body: {e}");
            TtsError::InternalError(None)
        })?;

        let samples = pcm::decode_s16le(&audio);

        tracing::debug!("TTS synthesis complete, {} samples", samples.len());

        Ok(Synthesis {
            samples,
            sample_rate: self.sample_rate,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
