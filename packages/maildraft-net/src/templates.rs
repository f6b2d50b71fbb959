//! Template persistence against a JSON REST endpoint.

use std::fmt;
use std::sync::Arc;

use maildraft_traits::net::{Bytes, HeaderMap, Method, NetError, Request};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Provider;

/// A stored template. `components` is opaque structured data owned by the
/// client; timestamps are RFC 3339 strings assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub name: String,
    pub html: String,
    pub css: String,
    pub components: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update; only populated fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
    html: &'a str,
    css: &'a str,
    components: &'a serde_json::Value,
}

#[derive(Debug)]
pub enum StoreError {
    Net(NetError),
    Decode(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Net(e) => write!(f, "{e}"),
            Self::Decode(msg) => write!(f, "unexpected store response: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<NetError> for StoreError {
    fn from(value: NetError) -> Self {
        Self::Net(value)
    }
}

pub struct TemplateStore {
    provider: Arc<Provider>,
    base: Url,
}

impl TemplateStore {
    pub fn new(provider: Arc<Provider>, base: Url) -> Self {
        Self { provider, base }
    }

    pub async fn create(
        &self,
        name: &str,
        html: &str,
        css: &str,
        components: serde_json::Value,
    ) -> Result<TemplateRecord, StoreError> {
        let payload = CreateRequest {
            name,
            html,
            css,
            components: &components,
        };
        let body = encode(&payload)?;
        let response = self
            .provider
            .fetch_ok(Request::post_json(self.base.clone(), body))
            .await?;
        decode(&response.body)
    }

    pub async fn update(&self, id: &str, patch: TemplatePatch) -> Result<TemplateRecord, StoreError> {
        let response = self
            .provider
            .fetch_ok(Request {
                url: self.record_url(id)?,
                method: Method::PATCH,
                headers: HeaderMap::new(),
                content_type: "application/json".to_string(),
                body: encode(&patch)?,
            })
            .await?;
        decode(&response.body)
    }

    pub async fn get(&self, id: &str) -> Result<TemplateRecord, StoreError> {
        let response = self
            .provider
            .fetch_ok(Request::get(self.record_url(id)?))
            .await?;
        decode(&response.body)
    }

    /// All templates, most recently updated first. Ordering is enforced
    /// here rather than trusted from the server.
    pub async fn list(&self) -> Result<Vec<TemplateRecord>, StoreError> {
        let response = self
            .provider
            .fetch_ok(Request::get(self.base.clone()))
            .await?;
        let records = decode(&response.body)?;
        Ok(order_by_recency(records))
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.provider
            .fetch_ok(Request {
                url: self.record_url(id)?,
                method: Method::DELETE,
                headers: HeaderMap::new(),
                content_type: String::new(),
                body: Bytes::new(),
            })
            .await?;
        Ok(())
    }

    fn record_url(&self, id: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Decode("store url cannot be a base".to_string()))?
            .push(id);
        Ok(url)
    }
}

fn encode(payload: &impl Serialize) -> Result<Bytes, StoreError> {
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(|e| StoreError::Decode(format!("request serialization: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(body).map_err(|e| StoreError::Decode(e.to_string()))
}

fn order_by_recency(mut records: Vec<TemplateRecord>) -> Vec<TemplateRecord> {
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, updated_at: &str) -> TemplateRecord {
        TemplateRecord {
            id: id.to_string(),
            name: format!("template {id}"),
            html: "<p>x</p>".to_string(),
            css: String::new(),
            components: serde_json::Value::Null,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    #[test]
    fn listing_orders_by_most_recent_update() {
        let ordered = order_by_recency(vec![
            record("a", "2026-01-02T10:00:00Z"),
            record("b", "2026-03-15T08:30:00Z"),
            record("c", "2026-02-01T23:59:59Z"),
        ]);
        let ids: Vec<&str> = ordered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn patch_omits_unset_fields() {
        let patch = TemplatePatch {
            html: Some("<p>new</p>".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["html"], "<p>new</p>");
        assert!(json.get("name").is_none());
        assert!(json.get("css").is_none());
        assert!(json.get("components").is_none());
    }

    #[test]
    fn record_round_trips_through_json() {
        let original = record("42", "2026-05-05T05:05:05Z");
        let json = serde_json::to_string(&original).unwrap();
        let back: TemplateRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
