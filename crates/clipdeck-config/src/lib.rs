#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod health;
mod loader;
pub mod server;
pub mod stt;
pub mod telemetry;
pub mod tiktok;
pub mod tts;

use serde::Deserialize;

pub use cors::*;
pub use health::*;
pub use server::*;
pub use stt::*;
pub use telemetry::*;
pub use tiktok::*;
pub use tts::*;

/// Top-level clipdeck configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// STT provider configuration
    #[serde(default)]
    pub stt: SttConfig,
    /// TTS provider configuration
    #[serde(default)]
    pub tts: TtsConfig,
    /// TikTok upload configuration
    #[serde(default)]
    pub tiktok: TiktokConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
