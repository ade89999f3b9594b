use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::{
    error::{Result, TiktokError},
    session::{CookieMap, ESSENTIAL_COOKIES, Session, cookies_from_json},
};

const COOKIE_FILE_SUFFIX: &str = "_cookies.json";

/// Per-account cookie storage
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored cookies for `username`
    async fn load(&self, username: &str) -> Result<CookieMap>;

    /// Replace the stored cookies for `username`
    async fn save(&self, username: &str, cookies: &CookieMap) -> Result<()>;

    /// Accounts with stored cookies, sorted
    async fn list_users(&self) -> Result<Vec<String>>;

    /// Load cookies and bind them to an outbound proxy
    async fn session(&self, username: &str, proxy: Option<Url>) -> Result<Session> {
        Ok(Session::new(self.load(username).await?, proxy))
    }
}

/// One pretty-printed JSON file per account: `<dir>/<username>_cookies.json`
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, username: &str) -> Result<PathBuf> {
        validate_username(username)?;
        Ok(self.dir.join(format!("{username}{COOKIE_FILE_SUFFIX}")))
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() || username.contains(['/', '\\']) || username.contains("..") {
        return Err(TiktokError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

fn warn_if_not_logged_in(username: &str, cookies: &CookieMap) {
    if !ESSENTIAL_COOKIES.iter().any(|name| cookies.contains_key(*name)) {
        tracing::warn!(
            "Cookies for '{username}' contain none of {}; the account may not be logged in",
            ESSENTIAL_COOKIES.join(", ")
        );
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self, username: &str) -> Result<CookieMap> {
        let path = self.path_for(username)?;

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TiktokError::CredentialsNotFound(username.to_string()));
            }
            Err(e) => {
                return Err(TiktokError::CredentialStore(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let values: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&raw)
            .map_err(|e| TiktokError::CredentialStore(format!("invalid cookie file {}: {e}", path.display())))?;

        let cookies = cookies_from_json(values);
        warn_if_not_logged_in(username, &cookies);

        tracing::debug!("Loaded {} cookie(s) for '{username}'", cookies.len());

        Ok(cookies)
    }

    async fn save(&self, username: &str, cookies: &CookieMap) -> Result<()> {
        let path = self.path_for(username)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| TiktokError::CredentialStore(format!("failed to create {}: {e}", self.dir.display())))?;

        let json = serde_json::to_vec_pretty(cookies)
            .map_err(|e| TiktokError::CredentialStore(format!("failed to encode cookies: {e}")))?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| TiktokError::CredentialStore(format!("failed to write {}: {e}", path.display())))?;

        warn_if_not_logged_in(username, cookies);
        tracing::info!("Saved {} cookie(s) for '{username}'", cookies.len());

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TiktokError::CredentialStore(format!(
                    "failed to list {}: {e}",
                    self.dir.display()
                )));
            }
        };

        let mut users = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TiktokError::CredentialStore(format!("failed to list {}: {e}", self.dir.display())))?
        {
            let name = entry.file_name();
            if let Some(user) = name
                .to_str()
                .and_then(|name| name.strip_suffix(COOKIE_FILE_SUFFIX))
                .filter(|user| !user.is_empty())
            {
                users.push(user.to_string());
            }
        }

        users.sort();
        Ok(users)
    }
}
