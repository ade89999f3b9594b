use clipdeck_core::OkStatus;
use serde::{Deserialize, Serialize};

/// Rate assumed when the caller omits `sample_rate`
pub const DEFAULT_INPUT_SAMPLE_RATE: u32 = 24_000;

/// `/asr` request body
#[derive(Debug, Deserialize)]
pub struct TranscriptionRequest {
    /// Mono float samples in `[-1, 1]`
    pub audio_array: Option<Vec<f32>>,
    /// Rate of `audio_array` in Hz
    #[serde(default)]
    pub sample_rate: Option<u32>,
    /// "provider/model", a bare model name, or nothing for the first provider's default
    #[serde(default)]
    pub model: Option<String>,
    /// ISO-639-1 hint, detected when absent
    #[serde(default)]
    pub language: Option<String>,
}

/// WAV-encoded audio handed to a provider
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// 16 kHz mono 16-bit WAV file
    pub wav: Vec<u8>,
    /// Model name without the provider prefix
    pub model: Option<String>,
    pub language: Option<String>,
}

/// A timed word within a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// A timed span of the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,
}

/// Recognized speech returned by a provider
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<Segment>,
}

/// `/asr` response body
#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub status: OkStatus,
    pub text: String,
    pub segments: Vec<Segment>,
}

impl From<Transcript> for TranscriptionResponse {
    fn from(transcript: Transcript) -> Self {
        Self {
            status: OkStatus::new(),
            text: transcript.text,
            segments: transcript.segments,
        }
    }
}
