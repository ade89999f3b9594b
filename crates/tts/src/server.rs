use std::time::Instant;

use clipdeck_config::{TtsConfig, TtsProviderType};
use clipdeck_telemetry::{Histogram, KeyValue, metrics};

use crate::{
    error::TtsError,
    provider::{TtsProvider, elevenlabs::ElevenLabsProvider, openai_tts::OpenAiTtsProvider},
    request::RequestContext,
    types::{SpeechRequest, Synthesis, SynthesisRequest},
};

/// Routes synthesis requests to the configured providers
pub struct Server {
    providers: Vec<Box<dyn TtsProvider>>,
    default_voice: String,
    default_speed: f32,
    duration: Histogram<f64>,
}

impl Server {
    /// Synthesize speech with the provider named by the model prefix
    ///
    /// Model format: "provider/model" (e.g. "kokoro/kokoro" or "elevenlabs/`eleven_turbo_v2`").
    /// Without a prefix the first configured provider is used and the
    /// whole value is taken as the model name.
    pub async fn synthesize(&self, request: SynthesisRequest, context: &RequestContext) -> crate::Result<Synthesis> {
        let text = request
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| TtsError::InvalidRequest("text is required".to_string()))?;

        let speed = request.speed.unwrap_or(self.default_speed);
        if !(0.25..=4.0).contains(&speed) {
            return Err(TtsError::InvalidRequest("speed must be between 0.25 and 4.0".to_string()));
        }

        let (provider, model) = self.route(request.model.as_deref())?;

        let speech = SpeechRequest {
            text,
            voice: request.voice.unwrap_or_else(|| self.default_voice.clone()),
            speed,
            model,
        };

        let start = Instant::now();
        let synthesis = provider.synthesize(&speech, context).await?;
        metrics::record_duration(&self.duration, start, &[KeyValue::new("provider", provider.name().to_string())]);

        if synthesis.samples.is_empty() {
            return Err(TtsError::NoAudio);
        }

        Ok(synthesis)
    }

    fn route(&self, model: Option<&str>) -> crate::Result<(&dyn TtsProvider, Option<String>)> {
        let (provider_name, model_name) = match model.map(|m| m.split_once('/')) {
            Some(Some((provider, model))) => (Some(provider), Some(model)),
            Some(None) => (None, model),
            None => (None, None),
        };

        let provider = match provider_name {
            Some(name) => self
                .providers
                .iter()
                .find(|p| p.name() == name)
                .ok_or_else(|| TtsError::ProviderNotFound(name.to_string()))?,
            None => self
                .providers
                .first()
                .ok_or_else(|| TtsError::ProviderNotFound("No TTS providers configured".to_string()))?,
        };

        let model_name = model_name.filter(|m| !m.is_empty()).map(str::to_string);

        Ok((provider.as_ref(), model_name))
    }
}

/// Builder for constructing the TTS server from configuration
pub struct TtsServerBuilder<'a> {
    config: &'a TtsConfig,
}

impl<'a> TtsServerBuilder<'a> {
    pub const fn new(config: &'a TtsConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> crate::Result<Server> {
        let mut providers: Vec<Box<dyn TtsProvider>> = Vec::new();

        for (name, provider_config) in &self.config.providers {
            tracing::debug!("Initializing TTS provider: {name}");

            let provider: Box<dyn TtsProvider> = match provider_config.provider_type {
                TtsProviderType::OpenaiTts => Box::new(OpenAiTtsProvider::new(
                    name.clone(),
                    provider_config.api_key.clone(),
                    provider_config.base_url.clone(),
                    provider_config.model.clone(),
                    provider_config.sample_rate,
                )),
                TtsProviderType::Elevenlabs => {
                    let api_key = provider_config.api_key.clone().ok_or_else(|| {
                        TtsError::ConfigError(format!("API key required for TTS provider '{name}'"))
                    })?;

                    Box::new(ElevenLabsProvider::new(
                        name.clone(),
                        api_key,
                        provider_config.base_url.clone(),
                        provider_config.model.clone(),
                        provider_config.sample_rate,
                    ))
                }
            };

            providers.push(provider);
        }

        if providers.is_empty() {
            tracing::debug!("No TTS providers configured");
        } else {
            tracing::debug!("TTS server initialized with {} provider(s)", providers.len());
        }

        let duration = clipdeck_telemetry::meter()
            .f64_histogram(metrics::TTS_REQUEST_DURATION)
            .with_unit("s")
            .build();

        Ok(Server {
            providers,
            default_voice: self.config.default_voice.clone(),
            default_speed: self.config.default_speed,
            duration,
        })
    }
}
