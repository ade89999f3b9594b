use std::{sync::OnceLock, time::Duration};

use reqwest::Client;

/// Long clips can take minutes on CPU-bound Whisper servers
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared client so providers reuse pooled connections
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .connect_timeout(Duration::from_secs(10))
                .pool_idle_timeout(Some(Duration::from_secs(30)))
                .tcp_nodelay(true)
                .build()
                .expect("STT HTTP client configuration is static")
        })
        .clone()
}
