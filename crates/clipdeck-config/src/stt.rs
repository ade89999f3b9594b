use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;

/// Top-level STT configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SttConfig {
    /// STT provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, SttProviderConfig>,
}

/// Configuration for a single STT provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SttProviderConfig {
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: SttProviderType,
    /// API key, optional for self-hosted Whisper servers
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model used when the request does not carry one
    #[serde(default)]
    pub model: Option<String>,
}

/// Supported STT providers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SttProviderType {
    /// `OpenAI`-compatible Whisper transcription endpoint
    Whisper,
    /// Deepgram
    Deepgram,
}
