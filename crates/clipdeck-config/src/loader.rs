use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no capability is enabled or the upload
    /// tables are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_has_capability()?;
        self.validate_tiktok_config()?;
        self.validate_tts_config()?;
        Ok(())
    }

    /// Ensure at least one capability is served
    fn validate_has_capability(&self) -> anyhow::Result<()> {
        let has_stt = !self.stt.providers.is_empty();
        let has_tts = !self.tts.providers.is_empty();

        if !has_stt && !has_tts && !self.tiktok.enabled {
            anyhow::bail!("at least one capability must be configured (STT provider, TTS provider, or TikTok upload)");
        }

        Ok(())
    }

    fn validate_tiktok_config(&self) -> anyhow::Result<()> {
        let tiktok = &self.tiktok;

        if !tiktok.enabled {
            return Ok(());
        }

        if tiktok.ingest.endpoints.is_empty() {
            anyhow::bail!("tiktok.ingest.endpoints must list at least one endpoint");
        }

        if tiktok.publish.attempts.is_empty() {
            anyhow::bail!("tiktok.publish.attempts must list at least one attempt");
        }

        tiktok.ingest.timeout()?;
        tiktok.publish.timeout()?;

        if let Some(ref proxy) = tiktok.proxy
            && !matches!(proxy.scheme(), "http" | "https" | "socks5" | "socks5h")
        {
            anyhow::bail!("tiktok.proxy has unsupported scheme '{}'", proxy.scheme());
        }

        Ok(())
    }

    fn validate_tts_config(&self) -> anyhow::Result<()> {
        if !(0.25..=4.0).contains(&self.tts.default_speed) {
            anyhow::bail!("tts.default_speed must be between 0.25 and 4.0");
        }

        for (name, provider) in &self.tts.providers {
            if provider.sample_rate == 0 {
                anyhow::bail!("TTS provider '{name}' must have a non-zero sample_rate");
            }
        }

        Ok(())
    }
}
