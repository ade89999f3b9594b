use std::time::Instant;

use clipdeck_config::{SttConfig, SttProviderType};
use clipdeck_telemetry::{Histogram, KeyValue, metrics};

use crate::{
    audio::{self, TARGET_SAMPLE_RATE},
    error::SttError,
    provider::{SttProvider, deepgram::DeepgramProvider, whisper::WhisperProvider},
    request::RequestContext,
    types::{AudioClip, DEFAULT_INPUT_SAMPLE_RATE, Transcript, TranscriptionRequest},
};

/// Routes transcription requests to the configured providers
pub struct Server {
    providers: Vec<Box<dyn SttProvider>>,
    duration: Histogram<f64>,
}

impl Server {
    /// Transcribe a float sample array
    ///
    /// Samples are resampled to 16 kHz and wrapped as WAV before upload.
    /// Model routing follows the same "provider/model" convention as `/tts`.
    pub async fn transcribe(&self, request: TranscriptionRequest, context: &RequestContext) -> crate::Result<Transcript> {
        let samples = request
            .audio_array
            .filter(|samples| !samples.is_empty())
            .ok_or_else(|| SttError::InvalidRequest("audio_array is required".to_string()))?;

        let sample_rate = request.sample_rate.unwrap_or(DEFAULT_INPUT_SAMPLE_RATE);
        if sample_rate == 0 {
            return Err(SttError::InvalidRequest("sample_rate must be positive".to_string()));
        }

        let (provider, model) = self.route(request.model.as_deref())?;

        let resampled = audio::resample_linear(&samples, sample_rate, TARGET_SAMPLE_RATE);
        let wav = audio::encode_wav(&resampled, TARGET_SAMPLE_RATE).map_err(|e| SttError::Encoding(e.to_string()))?;

        tracing::debug!(
            "Prepared {} samples at {sample_rate} Hz as {} byte WAV",
            samples.len(),
            wav.len()
        );

        let clip = AudioClip {
            wav,
            model,
            language: request.language.filter(|language| !language.is_empty()),
        };

        let start = Instant::now();
        let transcript = provider.transcribe(&clip, context).await?;
        metrics::record_duration(&self.duration, start, &[KeyValue::new("provider", provider.name().to_string())]);

        Ok(transcript)
    }

    fn route(&self, model: Option<&str>) -> crate::Result<(&dyn SttProvider, Option<String>)> {
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
                .ok_or_else(|| SttError::ProviderNotFound(name.to_string()))?,
            None => self
                .providers
                .first()
                .ok_or_else(|| SttError::ProviderNotFound("No STT providers configured".to_string()))?,
        };

        let model_name = model_name.filter(|m| !m.is_empty()).map(str::to_string);

        Ok((provider.as_ref(), model_name))
    }
}

/// Builder for constructing the STT server from configuration
pub struct SttServerBuilder<'a> {
    config: &'a SttConfig,
}

impl<'a> SttServerBuilder<'a> {
    pub const fn new(config: &'a SttConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> crate::Result<Server> {
        let mut providers: Vec<Box<dyn SttProvider>> = Vec::new();

        for (name, provider_config) in &self.config.providers {
            tracing::debug!("Initializing STT provider: {name}");

            let provider: Box<dyn SttProvider> = match provider_config.provider_type {
                SttProviderType::Whisper => Box::new(WhisperProvider::new(
                    name.clone(),
                    provider_config.api_key.clone(),
                    provider_config.base_url.clone(),
                    provider_config.model.clone(),
                )),
                SttProviderType::Deepgram => {
                    let api_key = provider_config.api_key.clone().ok_or_else(|| {
                        SttError::ConfigError(format!("API key required for STT provider '{name}'"))
                    })?;

                    Box::new(DeepgramProvider::new(
                        name.clone(),
                        api_key,
                        provider_config.base_url.clone(),
                        provider_config.model.clone(),
                    ))
                }
            };

            providers.push(provider);
        }

        if providers.is_empty() {
            tracing::debug!("No STT providers configured");
        } else {
            tracing::debug!("STT server initialized with {} provider(s)", providers.len());
        }

        let duration = clipdeck_telemetry::meter()
            .f64_histogram(metrics::STT_REQUEST_DURATION)
            .with_unit("s")
            .build();

        Ok(Server { providers, duration })
    }
}

#[cfg(test)]
mod tests {
    use clipdeck_config::SttProviderConfig;
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn deepgram_requires_key() {
        let mut config = SttConfig::default();
        config.providers.insert(
            "deepgram".to_string(),
            SttProviderConfig {
                provider_type: SttProviderType::Deepgram,
                api_key: None,
                base_url: None,
                model: None,
            },
        );

        let err = SttServerBuilder::new(&config).build().err().unwrap();
        assert!(err.to_string().contains("API key required"));
    }

    #[tokio::test]
    async fn empty_samples_are_rejected_before_routing() {
        let server = SttServerBuilder::new(&SttConfig::default()).build().unwrap();

        let request = TranscriptionRequest {
            audio_array: Some(Vec::new()),
            sample_rate: None,
            model: None,
            language: None,
        };

        let err = server.transcribe(request, &RequestContext::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "audio_array is required");
    }

    #[tokio::test]
    async fn named_provider_routing() {
        let mut config = SttConfig::default();
        for name in ["whisper", "deepgram"] {
            config.providers.insert(
                name.to_string(),
                SttProviderConfig {
                    provider_type: SttProviderType::Whisper,
                    api_key: Some(SecretString::from("k")),
                    base_url: None,
                    model: None,
                },
            );
        }

        let server = SttServerBuilder::new(&config).build().unwrap();

        let (provider, model) = server.route(Some("deepgram/nova-3")).unwrap();
        assert_eq!(provider.name(), "deepgram");
        assert_eq!(model.as_deref(), Some("nova-3"));

        let (provider, model) = server.route(Some("small")).unwrap();
        assert_eq!(provider.name(), "whisper");
        assert_eq!(model.as_deref(), Some("small"));

        assert!(matches!(server.route(Some("nope/x")), Err(SttError::ProviderNotFound(_))));
    }
}
