//! Networking for maildraft.
//!
//! Provides an implementation of the [`maildraft_traits::net::NetProvider`]
//! trait, plus clients for the editor's external collaborators: AI
//! text/image actions and email-safe conversion ([`ai`]), template
//! persistence ([`templates`]) and image hosting ([`upload`]).

pub mod ai;
pub mod templates;
pub mod upload;

pub use ai::{AiClient, AiError, TextAction};
pub use templates::{TemplatePatch, TemplateRecord, TemplateStore, StoreError};
pub use upload::{ImageHost, MAX_UPLOAD_BYTES, UploadClient, UploadError, sweep_base64_images};

use std::sync::Arc;

use data_url::DataUrl;
use maildraft_traits::net::{
    Bytes, HeaderMap, NetError, NetHandler, NetProvider, Request, Response,
};
use tokio::runtime::Handle;

pub struct Provider {
    rt: Handle,
    client: reqwest::Client,
}

impl Provider {
    /// Must be constructed inside a tokio runtime.
    pub fn new() -> Self {
        Self {
            rt: Handle::current(),
            client: reqwest::Client::new(),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    async fn fetch_inner(
        client: reqwest::Client,
        request: Request,
    ) -> Result<Response, ProviderError> {
        match request.url.scheme() {
            "data" => {
                let data_url = DataUrl::process(request.url.as_str())?;
                let (decoded, _fragment) = data_url.decode_to_vec()?;
                Ok(Response {
                    status: 200,
                    headers: HeaderMap::new(),
                    body: Bytes::from(decoded),
                })
            }
            _ => {
                let mut builder = client
                    .request(request.method, request.url.as_str())
                    .headers(request.headers);
                if !request.content_type.is_empty() {
                    builder = builder.header(http::header::CONTENT_TYPE, &request.content_type);
                }
                if !request.body.is_empty() {
                    builder = builder.body(request.body);
                }

                let response = builder.send().await?;
                let status = response.status().as_u16();
                let headers = response.headers().clone();
                let body = response.bytes().await?;
                Ok(Response {
                    status,
                    headers,
                    body,
                })
            }
        }
    }

    pub async fn fetch_async(&self, request: Request) -> Result<Response, ProviderError> {
        Self::fetch_inner(self.client.clone(), request).await
    }

    /// Like [`fetch_async`](Self::fetch_async), but additionally treats a
    /// non-success status as an error.
    pub async fn fetch_ok(&self, request: Request) -> Result<Response, NetError> {
        let response = self.fetch_async(request).await.map_err(NetError::from)?;
        if !response.is_success() {
            return Err(NetError::Status(response.status));
        }
        Ok(response)
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl NetProvider for Provider {
    fn fetch(&self, session_id: usize, request: Request, handler: Box<dyn NetHandler>) {
        let client = self.client.clone();
        self.rt.spawn(async move {
            #[cfg(feature = "tracing")]
            let url = request.url.to_string();

            let result = Self::fetch_inner(client, request)
                .await
                .map_err(NetError::from);

            #[cfg(feature = "tracing")]
            match &result {
                Ok(response) => tracing::debug!(url, status = response.status, "fetch settled"),
                Err(error) => tracing::warn!(url, %error, "fetch failed"),
            }

            handler.complete(session_id, result);
        });
    }
}

#[derive(Debug)]
pub enum ProviderError {
    Io(std::io::Error),
    DataUrl(data_url::DataUrlError),
    DataUrlBase64(data_url::forgiving_base64::InvalidBase64),
    ReqwestError(reqwest::Error),
}

impl From<std::io::Error> for ProviderError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<data_url::DataUrlError> for ProviderError {
    fn from(value: data_url::DataUrlError) -> Self {
        Self::DataUrl(value)
    }
}

impl From<data_url::forgiving_base64::InvalidBase64> for ProviderError {
    fn from(value: data_url::forgiving_base64::InvalidBase64) -> Self {
        Self::DataUrlBase64(value)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        Self::ReqwestError(value)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::DataUrl(_) => f.write_str("malformed data url"),
            Self::DataUrlBase64(_) => f.write_str("invalid base64 in data url"),
            Self::ReqwestError(e) => write!(f, "request error: {e}"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for NetError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::Io(e) => NetError::Transport(e.to_string()),
            ProviderError::DataUrl(_) => NetError::Decode("malformed data url".to_string()),
            ProviderError::DataUrlBase64(_) => {
                NetError::Decode("invalid base64 in data url".to_string())
            }
            ProviderError::ReqwestError(e) => NetError::Transport(e.to_string()),
        }
    }
}
