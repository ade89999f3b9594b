use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart},
};
use serde::de::DeserializeOwned;

use crate::{
    error::TiktokError,
    media::MediaPayload,
    uploader::{DEFAULT_TITLE, UploadOptions},
    visibility::Visibility,
};

/// Body limit for video uploads (512 MiB)
pub(crate) const UPLOAD_LIMIT_BYTES: usize = 512 << 20;

/// Body limit for JSON requests (1 MiB)
const JSON_LIMIT_BYTES: usize = 1 << 20;

/// Visibility applied when the form does not name one
const DEFAULT_VISIBILITY: &str = "PRIVATE";

/// Parsed `/upload_tiktok` form
#[derive(Debug)]
pub struct UploadForm {
    pub username: String,
    pub media: MediaPayload,
    pub options: UploadOptions,
}

/// Extractor for the multipart upload form
pub struct ExtractUpload(pub UploadForm);

impl<S> FromRequest<S> for ExtractUpload
where
    S: Send + Sync,
{
    type Rejection = TiktokError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = request
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            return Err(TiktokError::UnsupportedMediaType("Content-Type: multipart/form-data"));
        }

        let (parts, body) = request.into_parts();
        let bytes = read_body(body, UPLOAD_LIMIT_BYTES).await?;
        let request = http::Request::from_parts(parts, Body::from(bytes));

        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| TiktokError::InvalidRequest(format!("Failed to parse multipart form: {e}")))?;

        let mut video: Option<MediaPayload> = None;
        let mut username = None;
        let mut title = None;
        let mut visibility = None;
        let mut options = UploadOptions::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| TiktokError::InvalidRequest(format!("Failed to read multipart field: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "video" {
                let filename = field.file_name().unwrap_or("video.webm").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| TiktokError::InvalidRequest(format!("Failed to read video data: {e}")))?;

                video = Some(MediaPayload::new(bytes, filename, content_type));
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| TiktokError::InvalidRequest(format!("Failed to read {name} field: {e}")))?;

            match name.as_str() {
                "username" => username = Some(value),
                "title" => title = Some(value),
                "visibility" => visibility = Some(value),
                "allow_comment" => options.allow_comment = parse_flag(&name, &value)?,
                "allow_duet" => options.allow_duet = parse_flag(&name, &value)?,
                "allow_stitch" => options.allow_stitch = parse_flag(&name, &value)?,
                "brand_organic" => options.brand_organic = parse_flag(&name, &value)?,
                "brand_content" => options.brand_content = parse_flag(&name, &value)?,
                "ai_label" => options.ai_label = parse_flag(&name, &value)?,
                "schedule_time" => {
                    let timestamp = value
                        .trim()
                        .parse()
                        .map_err(|_| TiktokError::InvalidRequest("schedule_time must be a unix timestamp".to_string()))?;
                    options.schedule_time = Some(timestamp);
                }
                _ => {}
            }
        }

        let media = video
            .filter(|media| !media.is_empty())
            .ok_or_else(|| TiktokError::InvalidRequest("video file is required".to_string()))?;

        let username = username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| TiktokError::InvalidRequest("username is required".to_string()))?;

        options.title = title.filter(|t| !t.is_empty()).unwrap_or_else(|| DEFAULT_TITLE.to_string());
        options.visibility = Visibility::parse(visibility.as_deref().unwrap_or(DEFAULT_VISIBILITY));

        Ok(Self(UploadForm {
            username,
            media,
            options,
        }))
    }
}

/// Extractor for JSON request bodies
pub struct ExtractJson<T>(pub T);

impl<S, T> FromRequest<S> for ExtractJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = TiktokError;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        let is_json = request
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if !is_json {
            return Err(TiktokError::UnsupportedMediaType("Content-Type: application/json"));
        }

        let bytes = read_body(request.into_body(), JSON_LIMIT_BYTES).await?;

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| TiktokError::InvalidRequest(format!("Failed to parse request body: {e}")))
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, TiktokError> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
            TiktokError::PayloadTooLarge(limit)
        } else {
            TiktokError::InvalidRequest(format!("Failed to read request body: {err}"))
        }
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, TiktokError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(TiktokError::InvalidRequest(format!("{name} must be a boolean"))),
    }
}
