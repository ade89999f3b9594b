use std::time::Duration;

use clipdeck_config::IngestConfig;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::{
    attempt::{AttemptError, AttemptRecord, Stage, Verdict, is_success_status},
    media::MediaPayload,
    transport::{OutboundRequest, RequestBody, Transport},
};

/// Where the content identifier of an [`IngestResult`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStatus {
    /// An endpoint returned the identifier
    Confirmed { endpoint: Url },
    /// No endpoint produced an identifier; it was generated locally
    Fallback,
}

/// Output of the ingestion stage
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub content_id: String,
    /// Locally generated secondary key
    pub upload_id: String,
    /// Server-supplied secondary key, when the response carried one
    pub video_key: Option<String>,
    /// Response body of the confirming endpoint
    pub raw_response: Option<String>,
    pub status: IngestStatus,
}

impl IngestResult {
    pub const fn is_fallback(&self) -> bool {
        matches!(self.status, IngestStatus::Fallback)
    }

    fn fallback() -> Self {
        Self {
            content_id: format!("vid_{}", Uuid::now_v7().simple()),
            upload_id: generate_upload_id(),
            video_key: None,
            raw_response: None,
            status: IngestStatus::Fallback,
        }
    }
}

/// Probes candidate ingestion endpoints in order until one returns a content identifier
#[derive(Debug, Clone)]
pub struct IngestionProber {
    endpoints: Vec<Url>,
    timeout: Duration,
}

impl IngestionProber {
    pub const fn new(endpoints: Vec<Url>, timeout: Duration) -> Self {
        Self { endpoints, timeout }
    }

    /// Build a prober from the `[tiktok.ingest]` section
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout cannot be parsed
    pub fn from_config(config: &IngestConfig) -> anyhow::Result<Self> {
        Ok(Self::new(config.endpoints.clone(), config.timeout()?))
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    /// Upload the media and return its content identifier
    ///
    /// Never fails: when no endpoint yields an identifier, a locally
    /// generated placeholder is returned with status [`IngestStatus::Fallback`].
    /// Every attempt is appended to `trace`.
    pub async fn probe(
        &self,
        transport: &dyn Transport,
        media: &MediaPayload,
        trace: &mut Vec<AttemptRecord>,
    ) -> IngestResult {
        for endpoint in &self.endpoints {
            tracing::debug!("Attempting ingestion at {endpoint}");

            let request = OutboundRequest {
                url: endpoint.clone(),
                body: multipart_body(media),
                timeout: self.timeout,
            };

            let (status, outcome) = match transport.send(request).await {
                Ok(response) => {
                    let outcome = parse_ingest_response(endpoint, response.status, &response.body);
                    (Some(response.status), outcome)
                }
                Err(error) => (None, Err(error)),
            };

            match outcome {
                Ok(result) => {
                    tracing::info!("Ingestion confirmed by {endpoint}, content id {}", result.content_id);

                    trace.push(record(endpoint, status, Verdict::Confirmed));
                    return result;
                }
                Err(error) => {
                    if error == AttemptError::NoIdentifier {
                        tracing::warn!("Ingestion endpoint {endpoint} answered without a video_id, trying next");
                    } else {
                        tracing::debug!("Ingestion attempt at {endpoint} failed: {error}");
                    }

                    trace.push(record(endpoint, status, Verdict::Failed(error)));
                }
            }
        }

        tracing::warn!("No ingestion endpoint returned a video_id, continuing with a fallback identifier");

        IngestResult::fallback()
    }
}

fn multipart_body(media: &MediaPayload) -> RequestBody {
    RequestBody::Multipart {
        file_field: "video",
        filename: media.filename().to_string(),
        content_type: media.content_type().to_string(),
        bytes: media.bytes().clone(),
        fields: vec![
            ("upload_type".to_string(), "1".to_string()),
            ("file_size".to_string(), media.len().to_string()),
        ],
    }
}

fn record(endpoint: &Url, status: Option<u16>, verdict: Verdict) -> AttemptRecord {
    AttemptRecord {
        stage: Stage::Ingest,
        endpoint: endpoint.clone(),
        shape: None,
        status,
        verdict,
    }
}

fn parse_ingest_response(endpoint: &Url, status: u16, body: &[u8]) -> Result<IngestResult, AttemptError> {
    if !is_success_status(status) {
        return Err(AttemptError::Rejected { status });
    }

    let json: Value =
        serde_json::from_slice(body).map_err(|e| AttemptError::MalformedResponse(e.to_string()))?;

    let content_id = lookup_identifier(&json, "video_id").ok_or(AttemptError::NoIdentifier)?;

    Ok(IngestResult {
        content_id,
        upload_id: generate_upload_id(),
        video_key: lookup_identifier(&json, "video_key"),
        raw_response: Some(String::from_utf8_lossy(body).into_owned()),
        status: IngestStatus::Confirmed {
            endpoint: endpoint.clone(),
        },
    })
}

/// Read `key` at the top level or under `data`, accepting strings and numbers
pub(crate) fn lookup_identifier(json: &Value, key: &str) -> Option<String> {
    [json.get(key), json.get("data").and_then(|data| data.get(key))]
        .into_iter()
        .flatten()
        .find_map(identifier_text)
}

pub(crate) fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn generate_upload_id() -> String {
    format!("upload_{}", Uuid::now_v7().simple())
}
