//! Image hosting: upload validation, the upload call, and the base64
//! sweep that rewrites inline image data into hosted URLs before export.
//!
//! Validation happens before any network traffic: oversized or non-image
//! payloads are rejected locally with a descriptive error.

use std::fmt;
use std::sync::Arc;

use data_url::DataUrl;
use maildraft_traits::net::{Bytes, HeaderMap, Method, NetError, Request};
use serde::Deserialize;
use url::Url;

use crate::Provider;

/// Upload size cap: 5 MB.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug)]
pub enum UploadError {
    /// Payload exceeds [`MAX_UPLOAD_BYTES`].
    TooLarge(usize),
    /// Payload is not a recognized image format.
    NotAnImage,
    Net(NetError),
    /// The service answered, reporting a failure.
    Service(String),
    Decode(String),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge(size) => write!(
                f,
                "file is {:.1} MB; the limit is {} MB",
                *size as f64 / (1024.0 * 1024.0),
                MAX_UPLOAD_BYTES / (1024 * 1024),
            ),
            Self::NotAnImage => f.write_str("file is not an image"),
            Self::Net(e) => write!(f, "{e}"),
            Self::Service(msg) => write!(f, "upload service error: {msg}"),
            Self::Decode(msg) => write!(f, "unexpected upload response: {msg}"),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<NetError> for UploadError {
    fn from(value: NetError) -> Self {
        Self::Net(value)
    }
}

/// Check a payload is an acceptable image, returning its MIME type.
/// Sniffs magic bytes rather than trusting a caller-supplied type.
pub fn validate_image(data: &[u8]) -> Result<&'static str, UploadError> {
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge(data.len()));
    }
    match image::guess_format(data) {
        Ok(format) => Ok(format.to_mime_type()),
        Err(_) => Err(UploadError::NotAnImage),
    }
}

/// Something that can turn image bytes into a publicly-retrievable URL.
/// The base64 sweep is generic over this so it can be exercised without a
/// live endpoint.
pub trait ImageHost {
    fn host(
        &self,
        data: Vec<u8>,
        mime: &str,
    ) -> impl Future<Output = Result<String, UploadError>> + Send;
}

pub struct UploadClient {
    provider: Arc<Provider>,
    endpoint: Url,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
    error: Option<String>,
}

impl UploadClient {
    pub fn new(provider: Arc<Provider>, endpoint: Url) -> Self {
        Self { provider, endpoint }
    }

    /// Validate and upload an image, returning its hosted URL.
    pub async fn upload(&self, data: Vec<u8>) -> Result<String, UploadError> {
        let mime = validate_image(&data)?;
        self.host(data, mime).await
    }
}

impl ImageHost for UploadClient {
    async fn host(&self, data: Vec<u8>, mime: &str) -> Result<String, UploadError> {
        let response = self
            .provider
            .fetch_ok(Request {
                url: self.endpoint.clone(),
                method: Method::POST,
                headers: HeaderMap::new(),
                content_type: mime.to_string(),
                body: Bytes::from(data),
            })
            .await?;
        let parsed: UploadResponse = serde_json::from_slice(&response.body)
            .map_err(|e| UploadError::Decode(e.to_string()))?;
        match (parsed.url, parsed.error) {
            (Some(url), None) => Ok(url),
            (None, Some(error)) => Err(UploadError::Service(error)),
            _ => Err(UploadError::Decode(
                "expected exactly one of url/error".to_string(),
            )),
        }
    }
}

/// Replace each inline `data:image/...;base64,...` occurrence in the
/// markup with a hosted URL.
///
/// Failures are tolerated per occurrence: an upload that does not settle
/// successfully leaves that one occurrence as base64 and moves on.
pub async fn sweep_base64_images(html: &str, host: &impl ImageHost) -> String {
    const NEEDLE: &str = "data:image/";

    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find(NEEDLE) {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);

        let end = tail
            .find(['"', '\'', ')', '<', ' ', '\n', '\t'])
            .unwrap_or(tail.len());
        let occurrence = &tail[..end];
        rest = &tail[end..];

        match rehost_data_url(occurrence, host).await {
            Some(url) => out.push_str(&url),
            None => out.push_str(occurrence),
        }
    }

    out.push_str(rest);
    out
}

async fn rehost_data_url(occurrence: &str, host: &impl ImageHost) -> Option<String> {
    let data_url = DataUrl::process(occurrence).ok()?;
    let (data, _fragment) = data_url.decode_to_vec().ok()?;
    let mime = validate_image(&data).ok()?;
    match host.host(data, mime).await {
        Ok(url) => Some(url),
        Err(_error) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(%_error, "leaving inline image as base64");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // PNG signature, base64 "iVBORw0KGgo="
    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn oversized_files_are_rejected_locally() {
        let six_mb = vec![0u8; 6 * 1024 * 1024];
        assert!(matches!(
            validate_image(&six_mb),
            Err(UploadError::TooLarge(_))
        ));
    }

    #[test]
    fn non_images_are_rejected_with_a_type_error() {
        let result = validate_image(b"hello, plain text");
        assert!(matches!(result, Err(UploadError::NotAnImage)));
    }

    #[test]
    fn valid_png_bytes_pass_validation() {
        assert_eq!(validate_image(&PNG_MAGIC).unwrap(), "image/png");
    }

    /// Succeeds on the first call, fails on every later one.
    struct FlakyHost {
        calls: Mutex<usize>,
    }

    impl ImageHost for FlakyHost {
        async fn host(&self, _data: Vec<u8>, _mime: &str) -> Result<String, UploadError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                Ok("https://cdn.example/hosted-1.png".to_string())
            } else {
                Err(UploadError::Service("storage full".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn sweep_tolerates_individual_upload_failures() {
        let html = "<img src=\"data:image/png;base64,iVBORw0KGgo=\">\
                    <p>between</p>\
                    <img src=\"data:image/png;base64,iVBORw0KGgo=\">";
        let host = FlakyHost {
            calls: Mutex::new(0),
        };

        let swept = sweep_base64_images(html, &host).await;

        assert!(swept.contains("src=\"https://cdn.example/hosted-1.png\""));
        // the failed occurrence stays inline
        assert_eq!(swept.matches("data:image/png;base64").count(), 1);
        assert!(swept.contains("<p>between</p>"));
    }

    struct AlwaysOk;
    impl ImageHost for AlwaysOk {
        async fn host(&self, _data: Vec<u8>, _mime: &str) -> Result<String, UploadError> {
            Ok("https://cdn.example/ok.png".to_string())
        }
    }

    #[tokio::test]
    async fn sweep_leaves_markup_without_inline_images_untouched() {
        let html = "<img src=\"https://cdn.example/a.png\"><p>text</p>";
        assert_eq!(sweep_base64_images(html, &AlwaysOk).await, html);
    }

    #[tokio::test]
    async fn malformed_data_urls_are_left_alone() {
        let html = "<img src=\"data:image/png;base64,@@not-base64@@\">";
        assert_eq!(sweep_base64_images(html, &AlwaysOk).await, html);
    }
}
