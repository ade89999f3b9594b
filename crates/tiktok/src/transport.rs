use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, header};
use reqwest::{
    Client, Proxy,
    multipart::{Form, Part},
};
use url::Url;

use crate::{attempt::AttemptError, error::TiktokError, session::Session};

const TIKTOK_ORIGIN: &str = "https://www.tiktok.com";

/// Body of one outbound attempt
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// File part plus plain text fields
    Multipart {
        file_field: &'static str,
        filename: String,
        content_type: String,
        bytes: Bytes,
        fields: Vec<(String, String)>,
    },
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// One POST issued by the prober or the negotiator
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: Url,
    pub body: RequestBody,
    pub timeout: Duration,
}

/// Status and raw body of an answered request
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Sends attempts on behalf of an authenticated session
///
/// Implementations never retry; a failed send is reported once and the
/// caller decides whether to try another candidate.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, AttemptError>;
}

/// Builds a [`Transport`] bound to one session
pub trait Connector: Send + Sync {
    fn connect(&self, session: &Session) -> crate::Result<Arc<dyn Transport>>;
}

/// Connector producing reqwest clients that look like a desktop browser
#[derive(Debug, Clone)]
pub struct HttpConnector {
    user_agent: String,
}

impl HttpConnector {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    fn default_headers(&self, session: &Session) -> crate::Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| TiktokError::Session(format!("invalid user agent: {e}")))?;

        headers.insert(header::USER_AGENT, user_agent);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(header::ORIGIN, HeaderValue::from_static(TIKTOK_ORIGIN));
        headers.insert(header::REFERER, HeaderValue::from_static("https://www.tiktok.com/"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));

        if let Some(cookie) = session.cookie_header() {
            let mut value = HeaderValue::from_str(&cookie)
                .map_err(|_| TiktokError::Session("cookie values contain invalid characters".to_string()))?;
            value.set_sensitive(true);
            headers.insert(header::COOKIE, value);
        }

        Ok(headers)
    }
}

impl Connector for HttpConnector {
    fn connect(&self, session: &Session) -> crate::Result<Arc<dyn Transport>> {
        let mut builder = Client::builder()
            .default_headers(self.default_headers(session)?)
            .tcp_nodelay(true);

        if let Some(proxy) = session.proxy() {
            let proxy = Proxy::all(proxy.as_str())
                .map_err(|e| TiktokError::Session(format!("invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TiktokError::Session(format!("failed to build HTTP client: {e}")))?;

        Ok(Arc::new(HttpTransport { client }))
    }
}

/// reqwest-backed transport created by [`HttpConnector`]
struct HttpTransport {
    client: Client,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, AttemptError> {
        let builder = self
            .client
            .post(request.url.clone())
            .timeout(request.timeout);

        let builder = match request.body {
            RequestBody::Multipart {
                file_field,
                filename,
                content_type,
                bytes,
                fields,
            } => {
                let length = bytes.len() as u64;
                let part = Part::stream_with_length(bytes, length)
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(|e| AttemptError::TransportError(format!("invalid content type: {e}")))?;

                let form = fields
                    .into_iter()
                    .fold(Form::new().part(file_field, part), |form, (name, value)| form.text(name, value));

                builder.multipart(form)
            }
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> AttemptError {
    if error.is_timeout() {
        AttemptError::TransportTimeout
    } else {
        AttemptError::TransportError(error.to_string())
    }
}
