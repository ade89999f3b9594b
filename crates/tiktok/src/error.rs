use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clipdeck_core::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TiktokError>;

/// Upload service errors with appropriate HTTP status codes
///
/// Per-attempt failures never surface here; they are recovered inside the
/// prober and negotiator and only show up in the attempt trace.
#[derive(Debug, Error)]
pub enum TiktokError {
    /// Invalid request parameters
    #[error("{0}")]
    InvalidRequest(String),

    /// Request body is not of the expected content type
    #[error("Unsupported Content-Type, expected: '{0}'")]
    UnsupportedMediaType(&'static str),

    /// Request body exceeds the route's limit
    #[error("Request body is too large, limit is {0} bytes")]
    PayloadTooLarge(usize),

    /// No stored cookies for the account
    #[error("Cookies not found for user {0}. Please register first.")]
    CredentialsNotFound(String),

    /// Username cannot be mapped to a credential file
    #[error("Invalid username '{0}'")]
    InvalidUsername(String),

    /// Reading or writing the credential store failed
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    /// The outbound HTTP session could not be built (bad proxy, bad header value)
    #[error("Session error: {0}")]
    Session(String),

    /// The negotiation finished with a `Failed` outcome
    #[error("{0}")]
    UploadFailed(String),

    /// Internal server error
    /// If Some(message), it can be shown
    /// If None, it's an internal error and should not leak details
    #[error("Internal server error")]
    InternalError(Option<String>),
}

impl HttpError for TiktokError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::CredentialsNotFound(_) | Self::InvalidUsername(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            Self::CredentialStore(_) | Self::Session(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidUsername(_)
            | Self::UnsupportedMediaType(_)
            | Self::PayloadTooLarge(_) => "invalid_request_error",
            Self::CredentialsNotFound(_) => "credentials_not_found",
            Self::UploadFailed(_) => "upload_failed",
            Self::CredentialStore(_) | Self::Session(_) | Self::InternalError(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::InternalError(Some(message)) => message.clone(),
            Self::InternalError(None) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for TiktokError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("TikTok request failed: {self}");
        }

        (status, Json(self.error_body())).into_response()
    }
}
