use std::{sync::Arc, time::Instant};

use clipdeck_config::TiktokConfig;
use clipdeck_telemetry::{Counter, Histogram, KeyValue, metrics};

use crate::{
    attempt::{AttemptRecord, Verdict},
    error::TiktokError,
    ingest::{IngestResult, IngestionProber},
    media::MediaPayload,
    publish::{NegotiationOutcome, PublishNegotiator, PublishRequest},
    session::Session,
    transport::{Connector, HttpConnector},
    visibility::Visibility,
};

/// Default caption when the caller supplies none
pub const DEFAULT_TITLE: &str = "Generated Video";

/// Caller-controlled publish settings
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct UploadOptions {
    pub title: String,
    pub visibility: Visibility,
    pub allow_comment: bool,
    pub allow_duet: bool,
    pub allow_stitch: bool,
    pub brand_organic: bool,
    pub brand_content: bool,
    pub ai_label: bool,
    pub schedule_time: Option<i64>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            visibility: Visibility::Public,
            allow_comment: true,
            allow_duet: true,
            allow_stitch: true,
            brand_organic: false,
            brand_content: false,
            ai_label: false,
            schedule_time: None,
        }
    }
}

/// Everything one upload produced
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub ingest: IngestResult,
    pub outcome: NegotiationOutcome,
    /// Every attempt in the order it was issued
    pub trace: Vec<AttemptRecord>,
}

struct UploadMetrics {
    attempts: Counter<u64>,
    duration: Histogram<f64>,
}

impl UploadMetrics {
    fn new() -> Self {
        let meter = clipdeck_telemetry::meter();

        Self {
            attempts: meter
                .u64_counter(metrics::UPLOAD_ATTEMPT_COUNT)
                .with_description("Upload attempts by stage and verdict")
                .build(),
            duration: meter
                .f64_histogram(metrics::UPLOAD_DURATION)
                .with_description("Duration of a full upload negotiation")
                .with_unit("s")
                .build(),
        }
    }

    fn record(&self, report: &UploadReport, start: Instant) {
        for attempt in &report.trace {
            let verdict = match attempt.verdict {
                Verdict::Confirmed => "confirmed",
                Verdict::Ambiguous => "ambiguous",
                Verdict::Failed(_) => "failed",
            };

            self.attempts.add(
                1,
                &[
                    KeyValue::new("stage", attempt.stage.as_str()),
                    KeyValue::new("verdict", verdict),
                ],
            );
        }

        metrics::record_duration(
            &self.duration,
            start,
            &[KeyValue::new("outcome", report.outcome.as_str())],
        );
    }
}

/// Runs ingestion followed by publication for one video
pub struct Uploader {
    prober: IngestionProber,
    negotiator: PublishNegotiator,
    connector: Arc<dyn Connector>,
    metrics: UploadMetrics,
}

impl Uploader {
    pub fn new(prober: IngestionProber, negotiator: PublishNegotiator, connector: Arc<dyn Connector>) -> Self {
        Self {
            prober,
            negotiator,
            connector,
            metrics: UploadMetrics::new(),
        }
    }

    /// Build an uploader that talks HTTP with the configured endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if the ingest or publish settings are unusable
    pub fn from_config(config: &TiktokConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            IngestionProber::from_config(&config.ingest)?,
            PublishNegotiator::from_config(&config.publish)?,
            Arc::new(HttpConnector::new(config.user_agent.clone())),
        ))
    }

    /// Upload and publish a video for the session's account
    ///
    /// Attempt failures are absorbed into the report; a `Failed` outcome is
    /// still an `Ok` report.
    ///
    /// # Errors
    ///
    /// Returns an error if the video is empty or no HTTP session can be built
    pub async fn upload(
        &self,
        session: &Session,
        media: &MediaPayload,
        options: &UploadOptions,
    ) -> crate::Result<UploadReport> {
        if media.is_empty() {
            return Err(TiktokError::InvalidRequest("video file is empty".to_string()));
        }

        let start = Instant::now();
        let transport = self.connector.connect(session)?;

        tracing::info!(
            "Uploading {} ({} bytes, {}) as '{}' with visibility {}",
            media.filename(),
            media.len(),
            media.content_type(),
            options.title,
            options.visibility,
        );

        let mut trace = Vec::new();

        let ingest = self.prober.probe(transport.as_ref(), media, &mut trace).await;
        let request = PublishRequest::from_ingest(&ingest, options);
        let outcome = self.negotiator.negotiate(transport.as_ref(), &request, &mut trace).await;

        tracing::info!(
            "Upload finished: {} after {} attempt(s)",
            outcome.as_str(),
            trace.len()
        );

        let report = UploadReport { ingest, outcome, trace };
        self.metrics.record(&report, start);

        Ok(report)
    }
}
