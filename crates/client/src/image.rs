//! Best-match image payloads for notifications.
//!
//! The display surface wants the picture inline, so the canonical image URL
//! is fetched once and returned as a `data:` URI.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, Payload, Transport};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Fetch `url` and encode the body as a `data:` URI.
pub async fn fetch_data_uri<T: Transport + ?Sized>(
    transport: &T, url: &str, cancel: &CancellationToken,
) -> Result<String, ApiError> {
    if url.is_empty() {
        return Err(ApiError::InvalidUrl("empty image URL".into()));
    }
    let payload = transport.fetch_bytes(url, cancel).await?;
    Ok(data_uri(&payload, url))
}

/// Encode a payload as `data:{mime};base64,{body}`.
pub fn data_uri(payload: &Payload, url: &str) -> String {
    let mime = payload
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| mime_from_extension(url).to_string());
    format!("data:{mime};base64,{}", STANDARD.encode(&payload.bytes))
}

fn mime_from_extension(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => FALLBACK_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn payload(content_type: Option<&str>, body: &'static [u8]) -> Payload {
        Payload { content_type: content_type.map(str::to_string), bytes: Bytes::from_static(body) }
    }

    #[test]
    fn test_data_uri_uses_content_type() {
        let uri = data_uri(&payload(Some("image/png; charset=binary"), b"abc"), "https://cdn.example/x.jpg");
        assert_eq!(uri, "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_data_uri_falls_back_to_extension() {
        let uri = data_uri(&payload(None, b"abc"), "https://cdn.example/images/anime/1/2.JPG");
        assert!(uri.starts_with("data:image/jpeg;base64,"));

        let uri = data_uri(&payload(None, b""), "https://cdn.example/blob");
        assert_eq!(uri, "data:application/octet-stream;base64,");
    }
}
