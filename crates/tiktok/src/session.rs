use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Cookie name to value mapping as stored on disk
pub type CookieMap = BTreeMap<String, String>;

/// Cookies that indicate a logged-in TikTok web session
pub const ESSENTIAL_COOKIES: [&str; 3] = ["sessionid", "sid_tt", "sessionid_ss"];

/// Authenticated context for one account
///
/// Built once per upload and only read afterwards. Cookie values are kept
/// as secrets so they never end up in logs through `Debug`.
#[derive(Debug, Clone)]
pub struct Session {
    cookies: BTreeMap<String, SecretString>,
    proxy: Option<Url>,
}

impl Session {
    pub fn new(cookies: CookieMap, proxy: Option<Url>) -> Self {
        let cookies = cookies
            .into_iter()
            .map(|(name, value)| (name, SecretString::from(value)))
            .collect();

        Self { cookies, proxy }
    }

    /// Outbound proxy for this session, if any
    pub const fn proxy(&self) -> Option<&Url> {
        self.proxy.as_ref()
    }

    /// Essential session cookies present in this session
    pub fn essential_cookies(&self) -> Vec<&'static str> {
        ESSENTIAL_COOKIES
            .into_iter()
            .filter(|name| self.cookies.contains_key(*name))
            .collect()
    }

    /// `Cookie` header value, or `None` when the session has no cookies
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={}", value.expose_secret()))
            .collect::<Vec<_>>()
            .join("; ");

        Some(header)
    }
}

/// Convert arbitrary JSON cookie values into strings
///
/// Strings are kept verbatim, anything else is stored as its JSON text.
pub fn cookies_from_json(values: serde_json::Map<String, serde_json::Value>) -> CookieMap {
    values
        .into_iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(s) => (name, s),
            other => (name, other.to_string()),
        })
        .collect()
}
