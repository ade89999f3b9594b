//! Scripted transport used by the negotiation tests

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{
    attempt::AttemptError,
    media::MediaPayload,
    session::Session,
    transport::{Connector, OutboundRequest, Transport, TransportResponse},
};

/// Canned result for one call
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(TransportResponse),
    Fail(AttemptError),
}

impl Scripted {
    pub fn status_body(status: u16, body: &str) -> Self {
        Self::Respond(TransportResponse {
            status,
            body: Bytes::copy_from_slice(body.as_bytes()),
        })
    }
}

/// Replays scripted results in order and records every request
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<OutboundRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().iter().map(|r| r.url.path().to_string()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            None => Err(AttemptError::TransportError("unscripted call".to_string())),
        }
    }
}

/// Connector handing out one shared scripted transport
pub struct ScriptedConnector(pub Arc<ScriptedTransport>);

impl Connector for ScriptedConnector {
    fn connect(&self, _session: &Session) -> crate::Result<Arc<dyn Transport>> {
        Ok(self.0.clone())
    }
}

pub fn endpoints(count: usize) -> Vec<Url> {
    (1..=count)
        .map(|i| Url::parse(&format!("https://ingest.test/{i}/")).unwrap())
        .collect()
}

pub fn media() -> MediaPayload {
    MediaPayload::new(Bytes::from_static(b"video-bytes"), "clip.mp4", None)
}
