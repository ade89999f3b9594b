mod harness;

use clipdeck_config::{AnyOrList, CorsConfig};
use harness::config::ConfigBuilder;
use harness::mock_upstream::MockUpstream;
use harness::server::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new().with_tts_provider("kokoro", &mock).build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok", "message": "clipdeck API is running"}));
}

#[tokio::test]
async fn health_endpoint_disabled() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_tts_provider("kokoro", &mock)
        .without_health()
        .build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_tts_provider("kokoro", &mock)
        .with_cors(CorsConfig {
            origins: AnyOrList::List(vec!["http://localhost:3000".to_owned()]),
            methods: AnyOrList::Any,
            headers: AnyOrList::Any,
            credentials: false,
            max_age: None,
        })
        .build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .get(server.url("/health"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}

#[tokio::test]
async fn cors_rejects_unlisted_origin() {
    let mock = MockUpstream::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_tts_provider("kokoro", &mock)
        .with_cors(CorsConfig {
            origins: AnyOrList::List(vec!["http://localhost:3000".to_owned()]),
            methods: AnyOrList::Any,
            headers: AnyOrList::Any,
            credentials: false,
            max_age: None,
        })
        .build();

    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .get(server.url("/health"))
        .header("Origin", "http://evil.test")
        .send()
        .await
        .unwrap();

    assert!(resp.headers().get("access-control-allow-origin").is_none());
}
