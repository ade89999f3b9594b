use std::path::{Path, PathBuf};

use anyhow::Context;
use clipdeck_config::{Config, PayloadShape};
use tiktok::{
    CredentialStore, FileCredentialStore, MediaPayload, NegotiationOutcome, UploadOptions, UploadReport, Uploader,
    Visibility,
};

use crate::args::{RegisterArgs, ShowArgs, UploadArgs};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Run one upload and print the attempt trace
///
/// # Errors
///
/// Returns an error if the account has no cookies, the video cannot be
/// read or the negotiation fails
pub async fn upload(config: &Config, args: UploadArgs) -> anyhow::Result<()> {
    let tiktok = &config.tiktok;

    let store = FileCredentialStore::new(tiktok.cookies_dir.clone());
    let session = store
        .session(&args.user, args.proxy.clone().or_else(|| tiktok.proxy.clone()))
        .await?;

    let path = resolve_video(&tiktok.videos_dir, &args.video);
    let media = MediaPayload::from_path(&path)
        .await
        .with_context(|| format!("failed to read video {}", path.display()))?;

    let options = UploadOptions {
        title: args.title,
        visibility: Visibility::parse(&args.visibility),
        allow_comment: !args.no_comments,
        allow_duet: !args.no_duet,
        allow_stitch: !args.no_stitch,
        brand_organic: args.brand_organic,
        brand_content: args.brand_content,
        ai_label: args.ai_label,
        schedule_time: args.schedule,
    };

    println!("Uploading {} ({:.2} MB) as {}", media.filename(), mib(media.len() as u64), args.user);

    let uploader = Uploader::from_config(tiktok)?;
    let report = uploader.upload(&session, &media, &options).await?;

    print_report(&report);

    if let NegotiationOutcome::Failed { reason } = report.outcome {
        anyhow::bail!("upload failed: {reason}");
    }

    Ok(())
}

/// Store cookies read from a JSON file
///
/// # Errors
///
/// Returns an error if the file is not a JSON object or cannot be stored
pub async fn register(config: &Config, args: RegisterArgs) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.cookies)
        .await
        .with_context(|| format!("failed to read cookie file {}", args.cookies.display()))?;

    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&raw).context("cookie file must hold a JSON object")?;

    let cookies = tiktok::cookies_from_json(object);
    let store = FileCredentialStore::new(config.tiktok.cookies_dir.clone());
    store.save(&args.username, &cookies).await?;

    println!("Cookies registered for {} ({} cookies)", args.username, cookies.len());

    Ok(())
}

/// List stored accounts and local videos
///
/// Without flags both lists are printed.
///
/// # Errors
///
/// Returns an error if the cookie directory cannot be listed
pub async fn show(config: &Config, args: ShowArgs) -> anyhow::Result<()> {
    let both = !args.users && !args.videos;

    if args.users || both {
        let store = FileCredentialStore::new(config.tiktok.cookies_dir.clone());
        let users = store.list_users().await?;

        println!("Saved users");
        if users.is_empty() {
            println!("  No saved users found.");
        }
        for (index, user) in users.iter().enumerate() {
            println!("  {}. {user}", index + 1);
        }
    }

    if args.videos || both {
        let dir = &config.tiktok.videos_dir;
        let videos = tiktok::list_videos(dir)
            .await
            .with_context(|| format!("failed to list {}", dir.display()))?;

        println!("Available videos");
        if videos.is_empty() {
            println!("  No videos found in {}", dir.display());
        }
        for (index, (name, size)) in videos.iter().enumerate() {
            println!("  {}. {name} ({:.2} MB)", index + 1, mib(*size));
        }
    }

    Ok(())
}

fn resolve_video(videos_dir: &Path, video: &Path) -> PathBuf {
    if video.is_absolute() {
        video.to_path_buf()
    } else {
        videos_dir.join(video)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

fn print_report(report: &UploadReport) {
    for record in &report.trace {
        let shape = record.shape.map_or("-", PayloadShape::as_str);
        let status = record.status.map_or_else(|| "---".to_string(), |s| s.to_string());

        println!(
            "  [{}] {status} {shape} {} {}",
            record.stage.as_str(),
            record.endpoint,
            record.verdict
        );
    }

    if report.ingest.is_fallback() {
        println!("Ingestion unconfirmed, using local identifier {}", report.ingest.content_id);
    } else {
        println!("Ingested as {}", report.ingest.content_id);
    }

    match &report.outcome {
        NegotiationOutcome::Published { content_id } => {
            println!("Published: {}", content_id.as_deref().unwrap_or(&report.ingest.content_id));
        }
        NegotiationOutcome::AcceptedUnconfirmed { status } => {
            println!("Accepted with status {status}, publication not confirmed");
        }
        NegotiationOutcome::Failed { reason } => println!("Failed: {reason}"),
    }
}
