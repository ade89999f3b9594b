use axum::{body::Body, extract::FromRequest};
use http::StatusCode;
use secrecy::SecretString;
use serde::de::DeserializeOwned;

use crate::error::TtsError;

/// Header carrying a caller-supplied provider key
const PROVIDER_API_KEY_HEADER: &str = "X-Provider-API-Key";

/// Body limit for TTS requests (1 MiB)
const BODY_LIMIT_BYTES: usize = 1 << 20;

/// Per-request data that is not part of the JSON body
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Overrides the configured provider key
    pub api_key: Option<SecretString>,
}

/// Extractor for JSON request bodies
pub struct ExtractPayload<T>(pub RequestContext, pub T);

impl<S, T> FromRequest<S> for ExtractPayload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = TtsError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        let is_json = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if !is_json {
            return Err(TtsError::Rejected {
                status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
                message: "Unsupported Content-Type, expected: 'Content-Type: application/json'".to_string(),
            });
        }

        let bytes = axum::body::to_bytes(body, BODY_LIMIT_BYTES).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                TtsError::Rejected {
                    status: StatusCode::PAYLOAD_TOO_LARGE,
                    message: format!("Request body is too large, limit is {BODY_LIMIT_BYTES} bytes"),
                }
            } else {
                TtsError::InvalidRequest(format!("Failed to read request body: {err}"))
            }
        })?;

        let payload = serde_json::from_slice::<T>(&bytes)
            .map_err(|e| TtsError::InvalidRequest(format!("Failed to parse request body: {e}")))?;

        let context = RequestContext {
            api_key: parts
                .headers
                .get(PROVIDER_API_KEY_HEADER)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(|value| SecretString::from(value.to_string())),
        };

        Ok(Self(context, payload))
    }
}
