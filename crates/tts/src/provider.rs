pub(crate) mod elevenlabs;
pub(crate) mod openai_tts;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{
    error::TtsError,
    request::RequestContext,
    types::{SpeechRequest, Synthesis},
};

/// A speech synthesis backend
#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Synthesize text into mono samples
    async fn synthesize(&self, request: &SpeechRequest, context: &RequestContext) -> crate::Result<Synthesis>;

    /// Provider name as configured
    fn name(&self) -> &str;
}

/// Caller key first, then the configured key
fn effective_key<'a>(context: &'a RequestContext, configured: Option<&'a SecretString>) -> Option<&'a SecretString> {
    context.api_key.as_ref().or(configured)
}

/// Map a non-success provider answer to an error
async fn api_error(provider: &str, response: reqwest::Response) -> TtsError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

    tracing::error!("{provider} API error ({status}): {error_text}");

    match status.as_u16() {
        401 | 403 => TtsError::AuthenticationFailed(error_text),
        status => TtsError::ProviderApiError {
            status,
            message: error_text,
        },
    }
}
