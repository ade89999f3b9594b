use std::sync::Arc;

use url::Url;

use crate::{
    credentials::{CredentialStore, FileCredentialStore},
    error::Result,
    request::UploadForm,
    session::{CookieMap, Session},
    uploader::{UploadReport, Uploader},
};

/// Upload service shared by the TikTok routes
pub struct Server {
    uploader: Uploader,
    store: Arc<dyn CredentialStore>,
    proxy: Option<Url>,
}

impl Server {
    pub fn new(uploader: Uploader, store: Arc<dyn CredentialStore>, proxy: Option<Url>) -> Self {
        Self { uploader, store, proxy }
    }

    /// Build the service from the `[tiktok]` section
    ///
    /// # Errors
    ///
    /// Returns an error if the upload tables are unusable
    pub fn from_config(config: &clipdeck_config::TiktokConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            Uploader::from_config(config)?,
            Arc::new(FileCredentialStore::new(config.cookies_dir.clone())),
            config.proxy.clone(),
        ))
    }

    /// Load the account's cookies and run a full upload
    pub async fn upload(&self, form: UploadForm) -> Result<UploadReport> {
        let session = self.session(&form.username).await?;
        self.uploader.upload(&session, &form.media, &form.options).await
    }

    pub async fn session(&self, username: &str) -> Result<Session> {
        self.store.session(username, self.proxy.clone()).await
    }

    pub async fn register(&self, username: &str, cookies: &CookieMap) -> Result<()> {
        self.store.save(username, cookies).await
    }

    pub async fn users(&self) -> Result<Vec<String>> {
        self.store.list_users().await
    }
}
