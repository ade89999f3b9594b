use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use url::Url;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const PRIMARY_PUBLISH_ENDPOINT: &str = "https://www.tiktok.com/api/v1/web/project/publish/";
const UPLOAD_PUBLISH_ENDPOINT: &str = "https://www.tiktok.com/api/v1/web/upload/publish/";

const INGEST_ENDPOINTS: [&str; 3] = [
    "https://upload.tiktok.com/",
    "https://www.tiktok.com/upload/",
    "https://www.tiktok.com/api/v1/web/upload/",
];

/// TikTok upload configuration
///
/// Endpoint lists are ordered: the prober and the negotiator walk them
/// front to back and never reorder.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TiktokConfig {
    /// Expose the upload and credential routes
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Directory holding one `<username>_cookies.json` file per account
    #[serde(default = "default_cookies_dir")]
    pub cookies_dir: PathBuf,
    /// Directory relative video paths given to the CLI are resolved against
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,
    /// Outbound proxy applied to every upload session
    #[serde(default)]
    pub proxy: Option<Url>,
    /// User agent presented to the remote service
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Ingestion stage settings
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Publish stage settings
    #[serde(default)]
    pub publish: PublishConfig,
}

impl Default for TiktokConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cookies_dir: default_cookies_dir(),
            videos_dir: default_videos_dir(),
            proxy: None,
            user_agent: default_user_agent(),
            ingest: IngestConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

/// Candidate ingestion endpoints and per-attempt timeout
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Endpoints tried in order until one returns a content identifier
    #[serde(default = "default_ingest_endpoints")]
    pub endpoints: Vec<Url>,
    /// Per-attempt timeout (e.g. "60s")
    #[serde(default = "default_ingest_timeout")]
    pub timeout: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            endpoints: default_ingest_endpoints(),
            timeout: default_ingest_timeout(),
        }
    }
}

impl IngestConfig {
    /// Parsed per-attempt timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is invalid
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("tiktok.ingest.timeout", &self.timeout)
    }
}

/// Publish attempt table, form fallback and per-attempt timeout
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Endpoint and payload-shape pairs tried in order
    #[serde(default = "default_publish_attempts")]
    pub attempts: Vec<PublishAttemptConfig>,
    /// Endpoint for the last-resort form-encoded attempt; defaults to the first attempt's endpoint
    #[serde(default)]
    pub form_fallback_endpoint: Option<Url>,
    /// Per-attempt timeout (e.g. "30s")
    #[serde(default = "default_publish_timeout")]
    pub timeout: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            attempts: default_publish_attempts(),
            form_fallback_endpoint: None,
            timeout: default_publish_timeout(),
        }
    }
}

impl PublishConfig {
    /// Parsed per-attempt timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is invalid
    pub fn timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("tiktok.publish.timeout", &self.timeout)
    }

    /// Endpoint used by the form-encoded fallback attempt
    pub fn form_fallback(&self) -> Option<&Url> {
        self.form_fallback_endpoint
            .as_ref()
            .or_else(|| self.attempts.first().map(|attempt| &attempt.endpoint))
    }
}

/// One row of the publish attempt table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishAttemptConfig {
    pub endpoint: Url,
    pub shape: PayloadShape,
}

/// Body layouts the publish negotiator knows how to encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// `caption`, `privacy_level` and explicit `disable_*` flags
    Standard,
    /// `desc` plus identifiers
    Minimal,
    /// Both `caption` and `desc`, download permission and labelling flags
    Extended,
}

impl PayloadShape {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Minimal => "minimal",
            Self::Extended => "extended",
        }
    }
}

fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{value}': {e}"))
}

fn static_url(raw: &str) -> Url {
    Url::parse(raw).expect("built-in endpoint must be a valid URL")
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_cookies_dir() -> PathBuf {
    PathBuf::from("CookiesDir")
}

fn default_videos_dir() -> PathBuf {
    PathBuf::from("VideosDirPath")
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_ingest_endpoints() -> Vec<Url> {
    INGEST_ENDPOINTS.iter().map(|raw| static_url(raw)).collect()
}

fn default_ingest_timeout() -> String {
    "60s".to_string()
}

fn default_publish_attempts() -> Vec<PublishAttemptConfig> {
    vec![
        PublishAttemptConfig {
            endpoint: static_url(PRIMARY_PUBLISH_ENDPOINT),
            shape: PayloadShape::Standard,
        },
        PublishAttemptConfig {
            endpoint: static_url(UPLOAD_PUBLISH_ENDPOINT),
            shape: PayloadShape::Minimal,
        },
        PublishAttemptConfig {
            endpoint: static_url(PRIMARY_PUBLISH_ENDPOINT),
            shape: PayloadShape::Extended,
        },
    ]
}

fn default_publish_timeout() -> String {
    "30s".to_string()
}
