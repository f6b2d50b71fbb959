//! AI-backed actions: text rewriting, image generation, and HTML to
//! email-safe conversion.
//!
//! Requests go to a remote completion endpoint as JSON; responses carry
//! exactly one of a payload or an error message. Model output for the
//! conversion call may arrive wrapped in a markdown code fence, which is
//! stripped before use.

use std::fmt;
use std::sync::Arc;

use maildraft_traits::net::{Bytes, NetError, Request};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Provider;

/// What to do with the selected element's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAction {
    Rewrite,
    Translate,
    Shorter,
    Longer,
    ToneProfessional,
    ToneCasual,
}

impl TextAction {
    /// The instruction sent alongside the text.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Rewrite => "Rewrite this text to be clearer and more engaging.",
            Self::Translate => "Translate this text, keeping tone and intent.",
            Self::Shorter => "Shorten this text while keeping its meaning.",
            Self::Longer => "Expand this text with more detail.",
            Self::ToneProfessional => "Rewrite this text in a professional tone.",
            Self::ToneCasual => "Rewrite this text in a casual, friendly tone.",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextRequest<'a> {
    current_text: &'a str,
    action: TextAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

#[derive(Deserialize)]
struct TextResponse {
    text: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    image_url: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct ConvertRequest<'a> {
    html: &'a str,
}

#[derive(Deserialize)]
struct ConvertResponse {
    html: Option<String>,
    error: Option<String>,
}

#[derive(Debug)]
pub enum AiError {
    Net(NetError),
    /// The service answered, reporting a failure.
    Service(String),
    /// The response body was not the expected shape.
    Decode(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Net(e) => write!(f, "{e}"),
            Self::Service(msg) => write!(f, "AI service error: {msg}"),
            Self::Decode(msg) => write!(f, "unexpected AI response: {msg}"),
        }
    }
}

impl std::error::Error for AiError {}

impl From<NetError> for AiError {
    fn from(value: NetError) -> Self {
        Self::Net(value)
    }
}

pub struct AiClient {
    provider: Arc<Provider>,
    endpoint: Url,
}

impl AiClient {
    pub fn new(provider: Arc<Provider>, endpoint: Url) -> Self {
        Self { provider, endpoint }
    }

    /// Run a text action. `context` describes the element holding the text
    /// ("Tag: p, Classes: hero-copy") so the model can match register.
    pub async fn text_action(
        &self,
        current_text: &str,
        action: TextAction,
        context: Option<&str>,
    ) -> Result<String, AiError> {
        let payload = TextRequest {
            current_text,
            action,
            context,
        };
        let response: TextResponse = self.post("text", &payload).await?;
        match (response.text, response.error) {
            (Some(text), None) => Ok(text),
            (None, Some(error)) => Err(AiError::Service(error)),
            _ => Err(AiError::Decode(
                "expected exactly one of text/error".to_string(),
            )),
        }
    }

    /// Generate an image for a prompt, returning its hosted URL.
    pub async fn image_action(&self, prompt: &str) -> Result<String, AiError> {
        let response: ImageResponse = self.post("image", &ImageRequest { prompt }).await?;
        match (response.image_url, response.error) {
            (Some(url), None) => Ok(url),
            (None, Some(error)) => Err(AiError::Service(error)),
            _ => Err(AiError::Decode(
                "expected exactly one of imageUrl/error".to_string(),
            )),
        }
    }

    /// Convert arbitrary HTML into email-safe markup: styling inlined,
    /// unsupported constructs removed, visual fidelity preserved.
    pub async fn convert_to_email_safe(&self, html: &str) -> Result<String, AiError> {
        let response: ConvertResponse = self.post("convert", &ConvertRequest { html }).await?;
        match (response.html, response.error) {
            (Some(html), None) => Ok(strip_code_fences(&html).to_string()),
            (None, Some(error)) => Err(AiError::Service(error)),
            _ => Err(AiError::Decode(
                "expected exactly one of html/error".to_string(),
            )),
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &impl Serialize,
    ) -> Result<T, AiError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| AiError::Decode("endpoint cannot be a base".to_string()))?
            .push(path);
        let body = serde_json::to_vec(payload)
            .map_err(|e| AiError::Decode(format!("request serialization: {e}")))?;
        let response = self
            .provider
            .fetch_ok(Request::post_json(url, Bytes::from(body)))
            .await?;
        serde_json::from_slice(&response.body).map_err(|e| AiError::Decode(e.to_string()))
    }
}

/// Strip a markdown code fence wrapping, if present. Models asked for raw
/// HTML still answer with ```` ```html ... ``` ```` often enough.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("html", "xml", ...) up to the first newline
    let rest = match rest.find('\n') {
        Some(index) => &rest[index + 1..],
        None => rest,
    };
    rest.strip_suffix("```").map(str::trim).unwrap_or(trimmed)
}
