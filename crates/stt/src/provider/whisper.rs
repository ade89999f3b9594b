use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{SttProvider, api_error, effective_key};
use crate::{
    error::SttError,
    http_client::http_client,
    request::RequestContext,
    types::{AudioClip, Segment, Transcript, Word},
};

const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

const DEFAULT_MODEL: &str = "whisper-1";

/// OpenAI-compatible `/audio/transcriptions` provider
///
/// Asks for `verbose_json` with segment and word timestamps. Word entries
/// come back as a flat list and are attached to the segment they start in.
pub(crate) struct WhisperProvider {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    name: String,
}

impl WhisperProvider {
    pub fn new(name: String, api_key: Option<SecretString>, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            name,
        }
    }
}

#[derive(Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    id: Option<u32>,
    start: f64,
    end: f64,
    text: String,
}

fn into_transcript(response: VerboseTranscription) -> Transcript {
    let mut segments: Vec<Segment> = response
        .segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| Segment {
            id: segment.id.unwrap_or_else(|| u32::try_from(index).unwrap_or(u32::MAX)),
            start: segment.start,
            end: segment.end,
            text: segment.text.trim().to_string(),
            words: Vec::new(),
        })
        .collect();

    for word in response.words {
        let owner = segments
            .iter_mut()
            .rev()
            .find(|segment| segment.start <= word.start);

        if let Some(segment) = owner {
            segment.words.push(Word {
                word: word.word.trim().to_string(),
                ..word
            });
        }
    }

    Transcript {
        text: response.text.trim().to_string(),
        segments,
    }
}

#[async_trait]
impl SttProvider for WhisperProvider {
    async fn transcribe(&self, clip: &AudioClip, context: &RequestContext) -> crate::Result<Transcript> {
        let url = format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'));
        let model = clip.model.clone().unwrap_or_else(|| self.model.clone());

        tracing::debug!("Whisper transcription request: {} bytes, model={model}", clip.wav.len());

        let file = Part::bytes(clip.wav.clone())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::InternalError(Some(format!("Invalid content type: {e}"))))?;

        let mut form = Form::new()
            .part("file", file)
            .text("model", model)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .text("timestamp_granularities[]", "word");

        if let Some(language) = clip.language.clone() {
            form = form.text("language", language);
        }

        let mut builder = self.client.post(&url).multipart(form);

        if let Some(key) = effective_key(context, self.api_key.as_ref()) {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Whisper request failed: {e}");
            SttError::ConnectionError(format!("Failed to send request to {}: {e}", self.name))
        })?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        let result: VerboseTranscription = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Whisper response: {e}");
            SttError::InternalError(None)
        })?;

        let transcript = into_transcript(result);

        tracing::debug!("Whisper transcription complete, {} segment(s)", transcript.segments.len());

        Ok(transcript)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
