use http::StatusCode;
use serde::Serialize;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. Feature crates build
/// their axum responses from [`HttpError::error_body`], so every route
/// answers failures with the same envelope.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;

    /// Response body for this error
    fn error_body(&self) -> ErrorBody {
        ErrorBody {
            status: "error",
            message: self.client_message(),
            r#type: self.error_type().to_string(),
        }
    }
}

/// Error envelope: `{"status":"error","message":...,"type":...}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    pub r#type: String,
}

/// Marker serialized as `"ok"` in the `status` field of successful responses
#[derive(Debug, Clone, Copy, Default)]
pub struct OkStatus;

impl OkStatus {
    pub const fn new() -> Self {
        Self
    }
}

impl Serialize for OkStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("ok")
    }
}
