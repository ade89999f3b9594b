use std::path::Path;

use bytes::Bytes;

const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";

const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "webm", "avi", "mkv", "m4v"];

/// Raw video bytes with a declared content type and display filename
#[derive(Debug, Clone)]
pub struct MediaPayload {
    bytes: Bytes,
    content_type: String,
    filename: String,
}

impl MediaPayload {
    /// Build a payload, guessing the content type from the filename when none is declared
    pub fn new(bytes: impl Into<Bytes>, filename: impl Into<String>, content_type: Option<String>) -> Self {
        let filename = filename.into();
        let content_type = content_type
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
            .unwrap_or_else(|| guess_content_type(&filename).to_string());

        Self {
            bytes: bytes.into(),
            content_type,
            filename,
        }
    }

    /// Read a video file from disk
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map_or_else(|| "video.mp4".to_string(), |name| name.to_string_lossy().into_owned());

        Ok(Self::new(bytes, filename, None))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Video files directly inside `dir` with their sizes in bytes, sorted by name
///
/// # Errors
///
/// Returns the I/O error if the directory cannot be read
pub async fn list_videos(dir: &Path) -> std::io::Result<Vec<(String, u64)>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut videos = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_video = Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

        if is_video && entry.file_type().await?.is_file() {
            videos.push((name, entry.metadata().await?.len()));
        }
    }

    videos.sort();
    Ok(videos)
}

/// Content type for a video filename; unknown extensions fall back to `video/mp4`
pub fn guess_content_type(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("m4v") => "video/x-m4v",
        _ => DEFAULT_VIDEO_CONTENT_TYPE,
    }
}
