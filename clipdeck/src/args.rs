use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, Subcommand};
use url::Url;

/// Speech proxy and TikTok uploader for generated clips
#[derive(Debug, Parser)]
#[command(name = "clipdeck", about = "Speech proxy and TikTok uploader for generated clips")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "clipdeck.toml", env = "CLIPDECK_CONFIG", global = true)]
    pub config: PathBuf,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Upload a video from the command line
    Upload(UploadArgs),
    /// Store cookies exported from a logged-in browser session
    Register(RegisterArgs),
    /// List stored accounts or local videos
    Show(ShowArgs),
}

#[derive(Debug, Default, clap::Args)]
pub struct ServeArgs {
    /// Override the listen address
    #[arg(long, env = "CLIPDECK_LISTEN")]
    pub listen: Option<SocketAddr>,
}

#[derive(Debug, clap::Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct UploadArgs {
    /// Account whose stored cookies are used
    #[arg(long)]
    pub user: String,

    /// Video file, relative paths resolve against `tiktok.videos_dir`
    #[arg(short, long)]
    pub video: PathBuf,

    /// Caption
    #[arg(short, long, default_value = tiktok::DEFAULT_TITLE)]
    pub title: String,

    #[arg(long, default_value = "public", value_parser = ["public", "friends", "private"], ignore_case = true)]
    pub visibility: String,

    /// Unix timestamp to publish at
    #[arg(long)]
    pub schedule: Option<i64>,

    #[arg(long)]
    pub no_comments: bool,

    #[arg(long)]
    pub no_duet: bool,

    #[arg(long)]
    pub no_stitch: bool,

    /// Mark as branded organic content
    #[arg(long)]
    pub brand_organic: bool,

    /// Mark as branded content
    #[arg(long)]
    pub brand_content: bool,

    /// Mark as AI-generated content
    #[arg(long)]
    pub ai_label: bool,

    /// Proxy URL, overrides `tiktok.proxy`
    #[arg(short, long)]
    pub proxy: Option<Url>,
}

#[derive(Debug, clap::Args)]
pub struct RegisterArgs {
    /// Account name to store the cookies under
    pub username: String,

    /// JSON file holding a `{"name": "value"}` cookie object
    pub cookies: PathBuf,
}

#[derive(Debug, clap::Args)]
pub struct ShowArgs {
    /// Show all stored accounts
    #[arg(short, long)]
    pub users: bool,

    /// Show videos in `tiktok.videos_dir`
    #[arg(short, long)]
    pub videos: bool,
}
