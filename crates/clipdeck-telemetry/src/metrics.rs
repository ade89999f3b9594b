//! Metric names and recording helpers

use std::time::Instant;

use opentelemetry::{KeyValue, metrics::Histogram};

/// Record seconds elapsed since `start`
pub fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[KeyValue]) {
    histogram.record(start.elapsed().as_secs_f64(), attributes);
}

// Upload negotiation
pub const UPLOAD_ATTEMPT_COUNT: &str = "tiktok.upload.attempt.count";
pub const UPLOAD_DURATION: &str = "tiktok.upload.duration";

// Inference proxies
pub const TTS_REQUEST_DURATION: &str = "tts.request.duration";
pub const STT_REQUEST_DURATION: &str = "stt.request.duration";
