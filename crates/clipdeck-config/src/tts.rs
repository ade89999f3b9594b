use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;

/// Top-level TTS configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtsConfig {
    /// TTS provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, TtsProviderConfig>,
    /// Voice used when a request does not name one
    #[serde(default = "default_voice")]
    pub default_voice: String,
    /// Speed multiplier used when a request does not set one
    #[serde(default = "default_speed")]
    pub default_speed: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            providers: IndexMap::new(),
            default_voice: default_voice(),
            default_speed: default_speed(),
        }
    }
}

/// Configuration for a single TTS provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtsProviderConfig {
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: TtsProviderType,
    /// API key, optional for self-hosted OpenAI-compatible servers
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model used when the request does not carry one
    #[serde(default)]
    pub model: Option<String>,
    /// Sample rate of the raw PCM the provider returns
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// Supported TTS providers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsProviderType {
    /// `OpenAI`-compatible speech endpoint (`OpenAI`, Kokoro-FastAPI)
    OpenaiTts,
    /// `ElevenLabs`
    Elevenlabs,
}

fn default_voice() -> String {
    "bm_george".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_speed() -> f32 {
    1.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_sample_rate() -> u32 {
    24_000
}
