use std::time::Duration;

use clipdeck_config::{PayloadShape, PublishAttemptConfig, PublishConfig};
use serde_json::{Map, Value, json};
use url::Url;

use crate::{
    attempt::{AttemptError, AttemptRecord, Stage, Verdict, is_success_status},
    ingest::{IngestResult, identifier_text, lookup_identifier},
    transport::{OutboundRequest, RequestBody, Transport},
    uploader::UploadOptions,
    visibility::Visibility,
};

/// Metadata and identifiers sent to the publish endpoints
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct PublishRequest {
    pub caption: String,
    pub visibility: Visibility,
    pub allow_comment: bool,
    pub allow_duet: bool,
    pub allow_stitch: bool,
    pub brand_organic: bool,
    pub brand_content: bool,
    pub ai_label: bool,
    /// Unix timestamp for scheduled publication
    pub schedule_time: Option<i64>,
    pub content_id: String,
    pub upload_id: Option<String>,
    pub video_key: Option<String>,
}

impl PublishRequest {
    /// Combine ingestion identifiers with the caller's publish options
    pub fn from_ingest(ingest: &IngestResult, options: &UploadOptions) -> Self {
        Self {
            caption: options.title.clone(),
            visibility: options.visibility,
            allow_comment: options.allow_comment,
            allow_duet: options.allow_duet,
            allow_stitch: options.allow_stitch,
            brand_organic: options.brand_organic,
            brand_content: options.brand_content,
            ai_label: options.ai_label,
            schedule_time: options.schedule_time,
            content_id: ingest.content_id.clone(),
            upload_id: Some(ingest.upload_id.clone()).filter(|id| !id.is_empty()),
            video_key: ingest.video_key.clone(),
        }
    }

    fn has_content_id(&self) -> bool {
        !self.content_id.is_empty()
    }

    /// Whether the request carries the identifiers `shape` needs
    pub fn supports(&self, shape: PayloadShape) -> bool {
        match shape {
            PayloadShape::Standard | PayloadShape::Minimal => self.has_content_id(),
            PayloadShape::Extended => self.has_content_id() || self.upload_id.is_some(),
        }
    }

    /// JSON body for one publish attempt
    pub fn payload(&self, shape: PayloadShape) -> Value {
        let mut body = Map::new();

        match shape {
            PayloadShape::Standard => {
                body.insert("caption".into(), json!(self.caption));
                body.insert("privacy_level".into(), json!(self.visibility.code()));
                body.insert("disable_comment".into(), json!(!self.allow_comment));
                body.insert("disable_duet".into(), json!(!self.allow_duet));
                body.insert("disable_stitch".into(), json!(!self.allow_stitch));
                body.insert("video_id".into(), json!(self.content_id));
                body.insert("upload_id".into(), json!(self.upload_id));
            }
            PayloadShape::Minimal => {
                body.insert("desc".into(), json!(self.caption));
                body.insert("video_id".into(), json!(self.content_id));
                body.insert("upload_id".into(), json!(self.upload_id));
            }
            PayloadShape::Extended => {
                body.insert("caption".into(), json!(self.caption));
                body.insert("desc".into(), json!(self.caption));
                body.insert("privacy_level".into(), json!(self.visibility.code()));
                body.insert("allow_download_video".into(), json!(true));
                body.insert("allow_comment".into(), json!(self.allow_comment));

                if self.has_content_id() {
                    body.insert("video_id".into(), json!(self.content_id));
                }
                if let Some(upload_id) = &self.upload_id {
                    body.insert("upload_id".into(), json!(upload_id));
                }
                if let Some(video_key) = &self.video_key {
                    body.insert("video_key".into(), json!(video_key));
                }

                body.insert("brand_organic".into(), json!(self.brand_organic));
                body.insert("brand_content".into(), json!(self.brand_content));
                body.insert("ai_label".into(), json!(self.ai_label));
            }
        }

        if shape != PayloadShape::Minimal
            && let Some(schedule_time) = self.schedule_time
        {
            body.insert("schedule_time".into(), json!(schedule_time));
        }

        Value::Object(body)
    }

    /// Fields for the form-encoded last resort
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("caption".to_string(), self.caption.clone()),
            ("privacy_level".to_string(), self.visibility.code().to_string()),
        ];

        if self.has_content_id() {
            fields.push(("video_id".to_string(), self.content_id.clone()));
        }
        if let Some(upload_id) = &self.upload_id {
            fields.push(("upload_id".to_string(), upload_id.clone()));
        }

        fields
    }
}

/// Terminal result of a negotiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// An endpoint explicitly confirmed publication
    Published { content_id: Option<String> },
    /// A success-range status without an explicit confirmation
    AcceptedUnconfirmed { status: u16 },
    Failed { reason: String },
}

impl NegotiationOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Published { .. } => "published",
            Self::AcceptedUnconfirmed { .. } => "accepted_unconfirmed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// How a single publish response was read
#[derive(Debug, PartialEq, Eq)]
enum Classification {
    Published { content_id: Option<String> },
    Ambiguous,
    Failed(AttemptError),
}

/// Walks the publish attempt table until an endpoint accepts the request
#[derive(Debug, Clone)]
pub struct PublishNegotiator {
    attempts: Vec<PublishAttemptConfig>,
    form_fallback: Url,
    timeout: Duration,
}

impl PublishNegotiator {
    pub const fn new(attempts: Vec<PublishAttemptConfig>, form_fallback: Url, timeout: Duration) -> Self {
        Self {
            attempts,
            form_fallback,
            timeout,
        }
    }

    /// Build a negotiator from the `[tiktok.publish]` section
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is invalid or no form fallback endpoint can be derived
    pub fn from_config(config: &PublishConfig) -> anyhow::Result<Self> {
        let form_fallback = config
            .form_fallback()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("tiktok.publish needs at least one attempt or a form_fallback_endpoint"))?;

        Ok(Self::new(config.attempts.clone(), form_fallback, config.timeout()?))
    }

    /// Run the attempt table, then the form fallback if nothing was accepted
    ///
    /// Attempts are issued one at a time in table order. The first explicit
    /// success ends the negotiation; otherwise the first ambiguous success
    /// yields [`NegotiationOutcome::AcceptedUnconfirmed`].
    pub async fn negotiate(
        &self,
        transport: &dyn Transport,
        request: &PublishRequest,
        trace: &mut Vec<AttemptRecord>,
    ) -> NegotiationOutcome {
        let mut first_ambiguous: Option<u16> = None;

        for attempt in self.attempts.iter().filter(|a| request.supports(a.shape)) {
            let shape = attempt.shape;
            tracing::debug!("Trying {} publish format at {}", shape.as_str(), attempt.endpoint);

            let outbound = OutboundRequest {
                url: attempt.endpoint.clone(),
                body: RequestBody::Json(request.payload(shape)),
                timeout: self.timeout,
            };

            let (status, classification) = match transport.send(outbound).await {
                Ok(response) => (Some(response.status), classify(response.status, &response.body)),
                Err(error) => (None, Classification::Failed(error)),
            };

            let verdict = match classification {
                Classification::Published { content_id } => {
                    tracing::info!("Video published with {} format", shape.as_str());

                    trace.push(publish_record(attempt, status, Verdict::Confirmed));
                    return NegotiationOutcome::Published { content_id };
                }
                Classification::Ambiguous => {
                    if first_ambiguous.is_none() {
                        first_ambiguous = status;
                    }
                    Verdict::Ambiguous
                }
                Classification::Failed(error) => {
                    tracing::debug!("{} publish format at {} failed: {error}", shape.as_str(), attempt.endpoint);
                    Verdict::Failed(error)
                }
            };

            trace.push(publish_record(attempt, status, verdict));
        }

        if let Some(status) = first_ambiguous {
            tracing::info!("Publish accepted by server ({status}) without explicit confirmation");
            return NegotiationOutcome::AcceptedUnconfirmed { status };
        }

        tracing::warn!("No publish format was accepted, trying form-encoded fallback");

        self.form_fallback(transport, request, trace).await
    }

    async fn form_fallback(
        &self,
        transport: &dyn Transport,
        request: &PublishRequest,
        trace: &mut Vec<AttemptRecord>,
    ) -> NegotiationOutcome {
        let outbound = OutboundRequest {
            url: self.form_fallback.clone(),
            body: RequestBody::Form(request.form_fields()),
            timeout: self.timeout,
        };

        let accepted = match transport.send(outbound).await {
            Ok(response) if is_success_status(response.status) => Ok(response.status),
            Ok(response) => Err(AttemptError::Rejected {
                status: response.status,
            }),
            Err(error) => Err(error),
        };

        let status = match &accepted {
            Ok(status) | Err(AttemptError::Rejected { status }) => Some(*status),
            Err(_) => None,
        };

        trace.push(AttemptRecord {
            stage: Stage::FormFallback,
            endpoint: self.form_fallback.clone(),
            shape: None,
            status,
            verdict: accepted.clone().map_or_else(Verdict::Failed, |_| Verdict::Ambiguous),
        });

        match accepted {
            Ok(status) => {
                tracing::info!("Form-encoded publish accepted ({status})");
                NegotiationOutcome::AcceptedUnconfirmed { status }
            }
            Err(last) => {
                let reason = format!("{} (last error: {last})", AttemptError::AllAttemptsExhausted);
                tracing::error!("Publish failed: {reason}");
                NegotiationOutcome::Failed { reason }
            }
        }
    }
}

fn publish_record(attempt: &PublishAttemptConfig, status: Option<u16>, verdict: Verdict) -> AttemptRecord {
    AttemptRecord {
        stage: Stage::Publish,
        endpoint: attempt.endpoint.clone(),
        shape: Some(attempt.shape),
        status,
        verdict,
    }
}

fn classify(status: u16, body: &[u8]) -> Classification {
    let json = serde_json::from_slice::<Value>(body).ok();

    let message = json.as_ref().and_then(|json| {
        ["status_msg", "message", "msg"]
            .into_iter()
            .filter_map(|key| json.get(key).and_then(Value::as_str))
            .find(|msg| !msg.is_empty())
            .map(str::to_lowercase)
    });

    let mismatch = message.as_deref().is_some_and(|msg| msg.contains("url"));

    let zero_code = json.as_ref().is_some_and(|json| {
        ["status_code", "code"]
            .into_iter()
            .any(|key| json.get(key).and_then(Value::as_i64) == Some(0))
    });

    let explicit = zero_code
        || message
            .as_deref()
            .is_some_and(|msg| msg.contains("success") || msg.contains("published"));

    if is_success_status(status) && explicit && !mismatch {
        let content_id = json.as_ref().and_then(|json| {
            json.pointer("/data/video/id")
                .and_then(identifier_text)
                .or_else(|| lookup_identifier(json, "video_id"))
        });

        return Classification::Published { content_id };
    }

    if mismatch {
        return Classification::Failed(AttemptError::EndpointMismatch(message.unwrap_or_default()));
    }

    if is_success_status(status) {
        return Classification::Ambiguous;
    }

    Classification::Failed(AttemptError::Rejected { status })
}
