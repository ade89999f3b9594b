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

const DEFAULT_ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io/v1";

const DEFAULT_MODEL: &str = "eleven_multilingual_v2";

/// `ElevenLabs` TTS provider returning raw PCM
pub struct ElevenLabsProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    sample_rate: u32,
    name: String,
}

impl ElevenLabsProvider {
    pub fn new(
        name: String,
        api_key: SecretString,
        base_url: Option<String>,
        model: Option<String>,
        sample_rate: u32,
    ) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_ELEVENLABS_API_URL.to_string()),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            sample_rate,
            name,
        }
    }
}

#[derive(serde::Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(serde::Serialize)]
struct VoiceSettings {
    speed: f32,
}

#[async_trait]
impl TtsProvider for ElevenLabsProvider {
    async fn synthesize(&self, request: &SpeechRequest, context: &RequestContext) -> crate::Result<Synthesis> {
        let url = format!(
            "{}/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            request.voice
        );
        let model = request.model.as_deref().unwrap_or(&self.model);

        tracing::debug!(
            "ElevenLabs TTS request: model={model}, voice={}, input_len={}",
            request.voice,
            request.text.len(),
        );

        let body = ElevenLabsRequest {
            text: &request.text,
            model_id: model,
            voice_settings: VoiceSettings { speed: request.speed },
        };

        let key = effective_key(context, Some(&self.api_key)).unwrap_or(&self.api_key);

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", format!("pcm_{}", self.sample_rate))])
            .header("xi-api-key", key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("ElevenLabs request failed: {e}");
                TtsError::ConnectionError(format!("Failed to send request to ElevenLabs: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(api_error("ElevenLabs", response).await);
        }

        let audio = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read ElevenLabs response body: {e}");
            TtsError::InternalError(None)
        })?;

        let samples = pcm::decode_s16le(&audio);

        tracing::debug!("ElevenLabs TTS synthesis complete, {} samples", samples.len());

        Ok(Synthesis {
            samples,
            sample_rate: self.sample_rate,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
