//! Prefix-search API transport.
//!
//! The remote site answers `GET {api_url}{keyword}` with
//! `{"categories": [{"type": "anime", "items": [...]}]}`. Every request
//! carries a cancellation token; a cancelled request resolves to
//! [`ApiError::Cancelled`] instead of a response.

pub mod error;

pub use error::ApiError;

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;
use url::Url;

use omnisuggest_core::AppConfig;

/// Raw response body with its declared content type.
#[derive(Debug, Clone)]
pub struct Payload {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// HTTP transport capability used by the fetch orchestrator.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// GET `url` and return the decoded JSON body.
    async fn fetch_json(&self, url: &str, cancel: &CancellationToken) -> Result<serde_json::Value, ApiError>;

    /// GET `url` and return the raw body.
    async fn fetch_bytes(&self, url: &str, cancel: &CancellationToken) -> Result<Payload, ApiError>;
}

/// reqwest-backed transport sending the site's extra headers on every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.site.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Config(format!("header name {name:?}: {e}")))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| ApiError::Config(format!("header value {value:?}: {e}")))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .default_headers(headers)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    async fn get(&self, url: &str, accept: &str) -> Result<Payload, ApiError> {
        let url = Url::parse(url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let start = Instant::now();

        tracing::debug!("requesting {}", url);

        let response = self.http.get(url).header(header::ACCEPT, accept).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpError { status: status.as_u16() });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        tracing::debug!("response {} ({} bytes) in {:?}", status, bytes.len(), start.elapsed());

        Ok(Payload { content_type, bytes })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_json(&self, url: &str, cancel: &CancellationToken) -> Result<serde_json::Value, ApiError> {
        let payload = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = self.get(url, "application/json") => result?,
        };
        serde_json::from_slice(&payload.bytes).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn fetch_bytes(&self, url: &str, cancel: &CancellationToken) -> Result<Payload, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.get(url, "image/*") => result,
        }
    }
}
