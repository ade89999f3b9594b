use clipdeck_core::OkStatus;
use serde::{Deserialize, Serialize};

/// `/tts` request body
#[derive(Debug, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: Option<String>,
    /// Speech speed multiplier (0.25 to 4.0)
    pub speed: Option<f32>,
    /// Voice identifier (e.g. "`bm_george`" or an `ElevenLabs` voice ID)
    pub voice: Option<String>,
    /// "provider/model", a bare model name, or nothing for the first provider's default
    pub model: Option<String>,
}

/// Normalized request handed to a provider
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    /// Model name without the provider prefix
    pub model: Option<String>,
}

/// Decoded audio returned by a provider
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// `/tts` response body
#[derive(Debug, Serialize)]
pub struct SynthesisResponse {
    pub status: OkStatus,
    pub audio_array: Vec<f32>,
    pub sample_rate: u32,
}

impl From<Synthesis> for SynthesisResponse {
    fn from(synthesis: Synthesis) -> Self {
        Self {
            status: OkStatus::new(),
            audio_array: synthesis.samples,
            sample_rate: synthesis.sample_rate,
        }
    }
}
