#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Unofficial TikTok upload negotiation
//!
//! Uploads a video by probing ingestion endpoints, then walks an ordered
//! table of publish attempts until one is accepted. Cookies for each
//! account live in a [`CredentialStore`].

mod attempt;
mod credentials;
mod error;
mod ingest;
mod media;
mod publish;
mod request;
mod server;
mod session;
#[cfg(test)]
mod testing;
mod transport;
mod types;
mod uploader;
mod visibility;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use clipdeck_core::OkStatus;

pub use attempt::{AttemptError, AttemptRecord, Stage, Verdict};
pub use credentials::{CredentialStore, FileCredentialStore};
pub use error::{Result, TiktokError};
pub use ingest::{IngestResult, IngestStatus, IngestionProber};
pub use media::{MediaPayload, guess_content_type, list_videos};
pub use publish::{NegotiationOutcome, PublishNegotiator, PublishRequest};
pub use server::Server;
pub use session::{CookieMap, ESSENTIAL_COOKIES, Session, cookies_from_json};
pub use transport::{Connector, HttpConnector, OutboundRequest, RequestBody, Transport, TransportResponse};
pub use types::{AttemptSummary, IngestSummary, UploadResponse};
pub use uploader::{DEFAULT_TITLE, UploadOptions, UploadReport, Uploader};
pub use visibility::Visibility;

use request::{ExtractJson, ExtractUpload};
use types::{RegisterRequest, RegisterResponse, UsersResponse};

/// Build the upload service from configuration
pub fn build_server(config: &clipdeck_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Server::from_config(&config.tiktok)
        .map_err(|e| anyhow::anyhow!("Failed to initialize TikTok upload service: {e}"))?;

    Ok(Arc::new(server))
}

/// Create the endpoint router for uploads and credentials
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route(
            "/upload_tiktok",
            post(upload_tiktok).layer(DefaultBodyLimit::max(request::UPLOAD_LIMIT_BYTES)),
        )
        .route("/register_tiktok", post(register_tiktok))
        .route("/tiktok/users", get(list_users))
}

async fn upload_tiktok(
    State(server): State<Arc<Server>>,
    ExtractUpload(form): ExtractUpload,
) -> Result<Json<UploadResponse>> {
    tracing::debug!("TikTok upload handler called for user: {}", form.username);

    let report = server.upload(form).await?;

    Ok(Json(UploadResponse::try_from(report)?))
}

async fn register_tiktok(
    State(server): State<Arc<Server>>,
    ExtractJson(request): ExtractJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    let username = request.username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
    let cookies = request.cookies.filter(|c| !c.is_empty());

    let (Some(username), Some(cookies)) = (username, cookies) else {
        return Err(TiktokError::InvalidRequest(
            "username and cookies are required".to_string(),
        ));
    };

    let cookies = cookies_from_json(cookies);
    server.register(&username, &cookies).await?;

    let essential_cookies = ESSENTIAL_COOKIES
        .into_iter()
        .filter(|name| cookies.contains_key(*name))
        .collect();

    Ok(Json(RegisterResponse {
        status: OkStatus::new(),
        message: format!("Cookies registered for {username}"),
        cookies_count: cookies.len(),
        essential_cookies,
    }))
}

async fn list_users(State(server): State<Arc<Server>>) -> Result<Json<UsersResponse>> {
    let users = server.users().await?;

    Ok(Json(UsersResponse {
        status: OkStatus::new(),
        users,
    }))
}

#[cfg(test)]
mod tests {
    use std::{fmt::Write, time::Duration};

    use axum::body::Body;
    use clipdeck_config::PublishConfig;
    use http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{Scripted, ScriptedConnector, ScriptedTransport, endpoints};

    const BOUNDARY: &str = "clipdeck-test-boundary";

    struct Fixture {
        router: Router,
        transport: Arc<ScriptedTransport>,
        store: Arc<FileCredentialStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture(script: Vec<Scripted>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCredentialStore::new(dir.path()));
        let transport = Arc::new(ScriptedTransport::new(script));

        let uploader = Uploader::new(
            IngestionProber::new(endpoints(1), Duration::from_secs(1)),
            PublishNegotiator::from_config(&PublishConfig::default()).unwrap(),
            Arc::new(ScriptedConnector(transport.clone())),
        );

        let server = Arc::new(Server::new(uploader, store.clone(), None));

        Fixture {
            router: endpoint_router().with_state(server),
            transport,
            store,
            _dir: dir,
        }
    }

    fn upload_request(fields: &[(&str, &str)], video: Option<&[u8]>) -> Request<Body> {
        let mut body = String::new();

        for (name, value) in fields {
            write!(
                body,
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .unwrap();
        }

        let mut body = body.into_bytes();

        if let Some(video) = video {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"render.webm\"\r\nContent-Type: video/webm\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(video);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/upload_tiktok")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn register_alice(store: &FileCredentialStore) {
        let cookies = CookieMap::from([("sessionid".to_string(), "abc".to_string())]);
        store.save("alice", &cookies).await.unwrap();
    }

    #[tokio::test]
    async fn upload_publishes_with_form_defaults() {
        let fixture = fixture(vec![
            Scripted::status_body(200, r#"{"video_id":"7500"}"#),
            Scripted::status_body(200, r#"{"status_code":0,"data":{"video":{"id":"7500"}}}"#),
        ]);
        register_alice(&fixture.store).await;

        let (status, body) = call(
            fixture.router,
            upload_request(&[("username", "alice")], Some(b"webm-data")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["outcome"], "published");
        assert_eq!(body["content_id"], "7500");
        assert_eq!(body["ingest"]["status"], "confirmed");
        assert_eq!(body["attempts"].as_array().unwrap().len(), 2);

        let requests = fixture.transport.requests();
        let RequestBody::Multipart { content_type, .. } = &requests[0].body else {
            panic!("expected multipart ingestion");
        };
        assert_eq!(content_type, "video/webm");

        let RequestBody::Json(payload) = &requests[1].body else {
            panic!("expected JSON publish");
        };
        assert_eq!(payload["caption"], "Generated Video");
        assert_eq!(payload["privacy_level"], 2);
    }

    #[tokio::test]
    async fn upload_accepts_videos_beyond_default_body_limit() {
        let fixture = fixture(vec![
            Scripted::status_body(200, r#"{"video_id":"7500"}"#),
            Scripted::status_body(200, r#"{"status_code":0}"#),
        ]);
        register_alice(&fixture.store).await;

        let video = vec![0x1a; 3 << 20];
        let (status, body) = call(fixture.router, upload_request(&[("username", "alice")], Some(&video))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "published");

        let requests = fixture.transport.requests();
        let RequestBody::Multipart { bytes, .. } = &requests[0].body else {
            panic!("expected multipart ingestion");
        };
        assert_eq!(bytes.len(), 3 << 20);
    }

    #[tokio::test]
    async fn unknown_user_is_bad_request() {
        let fixture = fixture(vec![]);

        let (status, body) = call(
            fixture.router,
            upload_request(&[("username", "ghost")], Some(b"webm-data")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "status": "error",
                "message": "Cookies not found for user ghost. Please register first.",
                "type": "credentials_not_found"
            })
        );
        assert_eq!(fixture.transport.calls(), 0);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let fixture = fixture(vec![]);
        let (status, body) = call(fixture.router, upload_request(&[("username", "alice")], None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "video file is required");

        let fixture = self::fixture(vec![]);
        let (status, body) = call(fixture.router, upload_request(&[], Some(b"data"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "username is required");
    }

    #[tokio::test]
    async fn failed_negotiation_is_bad_gateway() {
        let fixture = fixture(vec![Scripted::status_body(500, "")]);
        register_alice(&fixture.store).await;

        let (status, body) = call(
            fixture.router,
            upload_request(&[("username", "alice"), ("visibility", "public")], Some(b"webm-data")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "error");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("no endpoint accepted the publish request")
        );
        assert_eq!(fixture.transport.calls(), 5);
    }

    #[tokio::test]
    async fn register_then_list() {
        let fixture = fixture(vec![]);

        let request = Request::post("/register_tiktok")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"username": "bob", "cookies": {"sessionid": "s", "sid_tt": "t", "odin_tt": 1}}).to_string(),
            ))
            .unwrap();

        let (status, body) = call(fixture.router.clone(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Cookies registered for bob");
        assert_eq!(body["cookies_count"], 3);
        assert_eq!(body["essential_cookies"], json!(["sessionid", "sid_tt"]));
        assert_eq!(fixture.store.load("bob").await.unwrap()["odin_tt"], "1");

        let request = Request::get("/tiktok/users").body(Body::empty()).unwrap();
        let (status, body) = call(fixture.router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "users": ["bob"]}));
    }

    #[tokio::test]
    async fn register_requires_both_fields() {
        let fixture = fixture(vec![]);

        let request = Request::post("/register_tiktok")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"username": "bob"}).to_string()))
            .unwrap();

        let (status, body) = call(fixture.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "username and cookies are required");
    }

    #[tokio::test]
    async fn register_rejects_traversal() {
        let fixture = fixture(vec![]);

        let request = Request::post("/register_tiktok")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"username": "../x", "cookies": {"a": "b"}}).to_string()))
            .unwrap();

        let (status, _) = call(fixture.router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
