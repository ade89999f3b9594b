use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{SttProvider, api_error};
use crate::{
    error::SttError,
    http_client::http_client,
    request::RequestContext,
    types::{AudioClip, Segment, Transcript, Word},
};

const DEFAULT_DEEPGRAM_API_URL: &str = "https://api.deepgram.com/v1";

const DEFAULT_MODEL: &str = "nova-2";

/// Deepgram pre-recorded audio provider
///
/// Utterances become segments.
pub struct DeepgramProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    name: String,
}

impl DeepgramProvider {
    pub fn new(name: String, api_key: SecretString, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_DEEPGRAM_API_URL.to_string()),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            name,
        }
    }
}

#[derive(Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(Deserialize)]
struct DeepgramResults {
    #[serde(default)]
    channels: Vec<DeepgramChannel>,
    #[serde(default)]
    utterances: Vec<DeepgramUtterance>,
}

#[derive(Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

#[derive(Deserialize)]
struct DeepgramUtterance {
    start: f64,
    end: f64,
    transcript: String,
    #[serde(default)]
    words: Vec<DeepgramWord>,
}

#[derive(Deserialize)]
struct DeepgramWord {
    word: String,
    #[serde(default)]
    punctuated_word: Option<String>,
    start: f64,
    end: f64,
}

fn into_transcript(results: DeepgramResults) -> Transcript {
    let text = results
        .channels
        .into_iter()
        .next()
        .and_then(|channel| channel.alternatives.into_iter().next())
        .map(|alternative| alternative.transcript)
        .unwrap_or_default();

    let segments = results
        .utterances
        .into_iter()
        .zip(0..)
        .map(|(utterance, id)| Segment {
            id,
            start: utterance.start,
            end: utterance.end,
            text: utterance.transcript,
            words: utterance
                .words
                .into_iter()
                .map(|word| Word {
                    word: word.punctuated_word.unwrap_or(word.word),
                    start: word.start,
                    end: word.end,
                })
                .collect(),
        })
        .collect();

    Transcript { text, segments }
}

#[async_trait]
impl SttProvider for DeepgramProvider {
    async fn transcribe(&self, clip: &AudioClip, context: &RequestContext) -> crate::Result<Transcript> {
        let url = format!("{}/listen", self.base_url.trim_end_matches('/'));
        let model = clip.model.as_deref().unwrap_or(&self.model);

        let mut query = vec![("model", model), ("punctuate", "true"), ("utterances", "true")];
        if let Some(language) = clip.language.as_deref() {
            query.push(("language", language));
        }

        tracing::debug!("Deepgram transcription request: {} bytes, model={model}", clip.wav.len());

        let key = context.api_key.as_ref().unwrap_or(&self.api_key);

        let response = self
            .client
            .post(&url)
            .query(&query)
            .header(http::header::AUTHORIZATION, format!("Token {}", key.expose_secret()))
            .header(http::header::CONTENT_TYPE, "audio/wav")
            .body(clip.wav.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Deepgram request failed: {e}");
                SttError::ConnectionError(format!("Failed to send request to {}: {e}", self.name))
            })?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        let result: DeepgramResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Deepgram response: {e}");
            SttError::InternalError(None)
        })?;

        tracing::debug!("Deepgram transcription complete");

        Ok(into_transcript(result.results))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
