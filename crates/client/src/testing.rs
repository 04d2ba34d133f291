//! In-process transport for orchestrator and session tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, Payload, Transport};

/// Answers every request with one canned body after a fixed latency and
/// records the requested URLs.
pub(crate) struct ScriptedTransport {
    body: Value,
    status: Option<u16>,
    latency: Duration,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn ok(body: Value) -> Self {
        Self { body, status: None, latency: Duration::from_millis(20), requests: Mutex::new(Vec::new()) }
    }

    pub(crate) fn failing(status: u16) -> Self {
        Self { status: Some(status), ..Self::ok(Value::Null) }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    async fn wait(&self, url: &str, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.requests.lock().unwrap().push(url.to_string());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            _ = tokio::time::sleep(self.latency) => match self.status {
                Some(status) => Err(ApiError::HttpError { status }),
                None => Ok(()),
            },
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch_json(&self, url: &str, cancel: &CancellationToken) -> Result<Value, ApiError> {
        self.wait(url, cancel).await?;
        Ok(self.body.clone())
    }

    async fn fetch_bytes(&self, url: &str, cancel: &CancellationToken) -> Result<Payload, ApiError> {
        self.wait(url, cancel).await?;
        Ok(Payload { content_type: Some("image/png".into()), bytes: Bytes::from_static(b"png") })
    }
}

/// One anime category holding the given names.
pub(crate) fn anime(names: &[&str]) -> Value {
    let items: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({
                "type": "anime",
                "name": name,
                "url": format!("https://myanimelist.net/anime/{}", name.len()),
                "image_url": "https://cdn.myanimelist.net/r/116x180/images/anime/1/1.jpg?s=abc",
                "payload": {"media_type": "TV", "start_year": 2002, "score": "7.9", "status": "Finished Airing"}
            })
        })
        .collect();
    json!({"categories": [{"type": "anime", "items": items}]})
}
