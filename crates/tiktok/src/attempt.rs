use std::fmt;

use clipdeck_config::PayloadShape;
use thiserror::Error;
use url::Url;

/// Why a single upload attempt did not produce a usable answer
///
/// Everything except `AllAttemptsExhausted` is recovered inside the
/// prober or negotiator by moving on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("request timed out")]
    TransportTimeout,

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service answered but reported that the request does not match the endpoint
    #[error("endpoint mismatch: {0}")]
    EndpointMismatch(String),

    #[error("response carried no content identifier")]
    NoIdentifier,

    #[error("rejected with status {status}")]
    Rejected { status: u16 },

    #[error("no endpoint accepted the publish request")]
    AllAttemptsExhausted,
}

/// Which step of the negotiation an attempt belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Publish,
    FormFallback,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Publish => "publish",
            Self::FormFallback => "form_fallback",
        }
    }
}

/// How an attempt was judged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Explicit success: an identifier on ingest, a success marker on publish
    Confirmed,
    /// Success-range status without an explicit marker
    Ambiguous,
    Failed(AttemptError),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => f.write_str("confirmed"),
            Self::Ambiguous => f.write_str("ambiguous"),
            Self::Failed(error) => write!(f, "failed: {error}"),
        }
    }
}

/// One line of the diagnostic attempt trace
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub stage: Stage,
    pub endpoint: Url,
    pub shape: Option<PayloadShape>,
    /// HTTP status, absent when the request never got an answer
    pub status: Option<u16>,
    pub verdict: Verdict,
}

impl AttemptRecord {
    pub const fn is_confirmed(&self) -> bool {
        matches!(self.verdict, Verdict::Confirmed)
    }
}

/// Status codes treated as nominal success
pub(crate) const fn is_success_status(status: u16) -> bool {
    matches!(status, 200..=202)
}
