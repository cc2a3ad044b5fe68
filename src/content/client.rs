use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::models::{About, Article, Collection, ContentKind, Homepage, Navigation};

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("content API returned {0}")]
    Status(u16),
    #[error("unexpected content payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Read-only client for the CMS content API. Public methods never fail:
/// upstream errors are logged and the page renders with what it has.
pub struct ContentClient {
    client: reqwest::Client,
    base_url: String,
}

impl ContentClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn list(&self, kind: ContentKind) -> Collection<Article> {
        match self.fetch(&format!("/api/{}/", kind.api_path())).await {
            Ok(Some(value)) => {
                let count_hint = value.get("count").and_then(Value::as_u64);
                let results: Vec<Article> = parse_items(collection_items(value));
                let count = count_hint.map_or(results.len(), |c| c as usize);
                Collection { results, count }
            }
            Ok(None) => Collection::default(),
            Err(e) => {
                tracing::error!("Error fetching {}: {e}", kind.api_path());
                Collection::default()
            }
        }
    }

    pub async fn get(&self, kind: ContentKind, slug: &str) -> Option<Article> {
        if !is_valid_slug(slug) {
            return None;
        }
        match self.fetch(&format!("/api/{}/{slug}/", kind.api_path())).await {
            Ok(value) => value.and_then(|v| serde_json::from_value(v).ok()),
            Err(e) => {
                tracing::error!("Error fetching {} '{slug}': {e}", kind.api_path());
                None
            }
        }
    }

    pub async fn recent(&self, kind: ContentKind) -> Vec<Article> {
        match self.fetch(&format!("/api/{}/recent/", kind.api_path())).await {
            Ok(Some(value)) => parse_items(collection_items(value)),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("Error fetching recent {}: {e}", kind.api_path());
                Vec::new()
            }
        }
    }

    pub async fn homepage(&self) -> Option<Homepage> {
        self.singleton("/api/homepage/").await
    }

    pub async fn about(&self) -> Option<About> {
        self.singleton("/api/about/").await
    }

    pub async fn navigation(&self) -> Navigation {
        match self.fetch("/api/stats/navigation/").await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            Ok(None) => Navigation::default(),
            Err(e) => {
                tracing::error!("Error fetching navigation: {e}");
                Navigation::default()
            }
        }
    }

    async fn singleton<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        match self.fetch(path).await {
            Ok(value) => value
                .and_then(singleton_item)
                .and_then(|v| serde_json::from_value(v).ok()),
            Err(e) => {
                tracing::error!("Error fetching {path}: {e}");
                None
            }
        }
    }

    /// GET a JSON document. A 404 is `Ok(None)`; other failures are errors.
    async fn fetch(&self, path: &str) -> Result<Option<Value>, ContentError> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ContentError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

/// Collections come back either as a bare array or as `{results, count}`.
fn collection_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Singletons may be an object, an array, or `{results}`; the first element
/// wins.
fn singleton_item(value: Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().next(),
        Value::Object(mut obj) => match obj.remove("results") {
            Some(Value::Array(items)) => items.into_iter().next(),
            Some(other) => {
                obj.insert("results".to_string(), other);
                Some(Value::Object(obj))
            }
            None => Some(Value::Object(obj)),
        },
        Value::Null => None,
        other => Some(other),
    }
}

/// Items of the wrong shape are skipped rather than failing the whole
/// listing.
fn parse_items<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
