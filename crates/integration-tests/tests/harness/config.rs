//! Programmatic configuration builder for integration tests

use std::{net::SocketAddr, path::Path};

use clipdeck_config::{
    Config, CorsConfig, IngestConfig, PayloadShape, PublishAttemptConfig, PublishConfig, ServerConfig, SttConfig,
    SttProviderConfig, SttProviderType, TiktokConfig, TtsConfig, TtsProviderConfig, TtsProviderType,
};

use super::mock_upstream::MockUpstream;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal config with every capability switched off
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                stt: SttConfig::default(),
                tts: TtsConfig::default(),
                tiktok: TiktokConfig {
                    enabled: false,
                    ..TiktokConfig::default()
                },
                telemetry: None,
            },
        }
    }

    /// Add an OpenAI-compatible TTS provider pointed at the mock
    pub fn with_tts_provider(mut self, name: &str, upstream: &MockUpstream) -> Self {
        self.config.tts.providers.insert(
            name.to_owned(),
            TtsProviderConfig {
                provider_type: TtsProviderType::OpenaiTts,
                api_key: None,
                base_url: Some(upstream.base_url()),
                model: None,
                sample_rate: 24_000,
            },
        );
        self
    }

    /// Add a Whisper STT provider pointed at the mock
    pub fn with_stt_provider(mut self, name: &str, upstream: &MockUpstream) -> Self {
        self.config.stt.providers.insert(
            name.to_owned(),
            SttProviderConfig {
                provider_type: SttProviderType::Whisper,
                api_key: None,
                base_url: Some(upstream.base_url()),
                model: Some("small".to_owned()),
            },
        );
        self
    }

    /// Enable uploads against the mock's ingest and publish routes
    pub fn with_tiktok(mut self, upstream: &MockUpstream, cookies_dir: &Path) -> Self {
        let attempt = |path: &str, shape| PublishAttemptConfig {
            endpoint: upstream.url(path),
            shape,
        };

        self.config.tiktok = TiktokConfig {
            enabled: true,
            cookies_dir: cookies_dir.to_path_buf(),
            ingest: IngestConfig {
                endpoints: vec![upstream.url("/ingest/primary"), upstream.url("/ingest/secondary")],
                timeout: "5s".to_owned(),
            },
            publish: PublishConfig {
                attempts: vec![
                    attempt("/publish/project", PayloadShape::Standard),
                    attempt("/publish/upload", PayloadShape::Minimal),
                    attempt("/publish/project", PayloadShape::Extended),
                ],
                form_fallback_endpoint: None,
                timeout: "5s".to_owned(),
            },
            ..TiktokConfig::default()
        };
        self
    }

    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
