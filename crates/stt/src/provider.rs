pub(crate) mod deepgram;
pub(crate) mod whisper;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::{
    error::SttError,
    request::RequestContext,
    types::{AudioClip, Transcript},
};

/// A speech recognition backend
#[async_trait]
pub trait SttProvider: Send + Sync {
    /// Transcribe a WAV clip
    async fn transcribe(&self, clip: &AudioClip, context: &RequestContext) -> crate::Result<Transcript>;

    /// Provider name as configured
    fn name(&self) -> &str;
}

/// Caller key first, then the configured key
fn effective_key<'a>(context: &'a RequestContext, configured: Option<&'a SecretString>) -> Option<&'a SecretString> {
    context.api_key.as_ref().or(configured)
}

/// Map a non-success provider answer to an error
async fn api_error(provider: &str, response: reqwest::Response) -> SttError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

    tracing::error!("{provider} API error ({status}): {error_text}");

    match status.as_u16() {
        401 | 403 => SttError::AuthenticationFailed(error_text),
        status => SttError::ProviderApiError {
            status,
            message: error_text,
        },
    }
}
