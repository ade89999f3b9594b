use clipdeck_core::OkStatus;
use serde::{Deserialize, Serialize};

use crate::{
    attempt::AttemptRecord,
    error::TiktokError,
    ingest::{IngestResult, IngestStatus},
    publish::NegotiationOutcome,
    uploader::UploadReport,
};

/// `/register_tiktok` request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub cookies: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: OkStatus,
    pub message: String,
    pub cookies_count: usize,
    pub essential_cookies: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub status: OkStatus,
    pub users: Vec<String>,
}

/// Successful `/upload_tiktok` response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: OkStatus,
    pub message: &'static str,
    pub outcome: &'static str,
    /// Identifier echoed by the publish endpoint, else the ingested one
    pub content_id: String,
    pub ingest: IngestSummary,
    pub attempts: Vec<AttemptSummary>,
}

#[derive(Debug, Serialize)]
pub struct IngestSummary {
    pub content_id: String,
    pub upload_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_key: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttemptSummary {
    pub stage: &'static str,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<&'static str>,
    pub http_status: Option<u16>,
    pub verdict: String,
}

impl From<&IngestResult> for IngestSummary {
    fn from(ingest: &IngestResult) -> Self {
        let (status, endpoint) = match &ingest.status {
            IngestStatus::Confirmed { endpoint } => ("confirmed", Some(endpoint.to_string())),
            IngestStatus::Fallback => ("fallback", None),
        };

        Self {
            content_id: ingest.content_id.clone(),
            upload_id: ingest.upload_id.clone(),
            video_key: ingest.video_key.clone(),
            status,
            endpoint,
        }
    }
}

impl From<&AttemptRecord> for AttemptSummary {
    fn from(record: &AttemptRecord) -> Self {
        Self {
            stage: record.stage.as_str(),
            endpoint: record.endpoint.to_string(),
            shape: record.shape.map(|shape| shape.as_str()),
            http_status: record.status,
            verdict: record.verdict.to_string(),
        }
    }
}

impl TryFrom<UploadReport> for UploadResponse {
    type Error = TiktokError;

    /// A `Failed` negotiation becomes [`TiktokError::UploadFailed`]
    fn try_from(report: UploadReport) -> Result<Self, Self::Error> {
        let outcome = report.outcome.as_str();

        let (message, content_id) = match report.outcome {
            NegotiationOutcome::Published { content_id } => (
                "Video uploaded to TikTok successfully",
                content_id.unwrap_or_else(|| report.ingest.content_id.clone()),
            ),
            NegotiationOutcome::AcceptedUnconfirmed { .. } => (
                "Video accepted by TikTok, publication unconfirmed",
                report.ingest.content_id.clone(),
            ),
            NegotiationOutcome::Failed { reason } => return Err(TiktokError::UploadFailed(reason)),
        };

        Ok(Self {
            status: OkStatus::new(),
            message,
            outcome,
            content_id,
            ingest: IngestSummary::from(&report.ingest),
            attempts: report.trace.iter().map(AttemptSummary::from).collect(),
        })
    }
}
