//! Google Cloud Storage JSON API client.
//!
//! Lists `GET {base}/storage/v1/b/{bucket}/o?prefix=..&pageToken=..` and
//! follows `nextPageToken` until the listing is exhausted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{BlobMeta, BlobStore};
use crate::error::ServiceError;

/// Objects requested per listing page.
const PAGE_SIZE: u32 = 1000;

/// Bucket reader backed by the Cloud Storage JSON API.
#[derive(Debug, Clone)]
pub struct GcsBlobStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
    updated: DateTime<Utc>,
}

impl GcsBlobStore {
    /// Creates a client for `bucket` at `base_url`.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            access_token,
        }
    }

    async fn fetch_page(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> Result<ObjectList, ServiceError> {
        let url = format!("{}/storage/v1/b/{}/o", self.base_url, self.bucket);
        let mut query: Vec<(&str, String)> = vec![
            ("prefix", prefix.to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
            ("fields", "items(name,updated),nextPageToken".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let mut request = self.client.get(&url).query(&query);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?
            .error_for_status()
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        response
            .json::<ObjectList>()
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn list_blobs(&self, prefix: &str) -> Result<Vec<BlobMeta>, ServiceError> {
        let mut blobs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.fetch_page(prefix, page_token.as_deref()).await?;
            blobs.extend(page.items.into_iter().map(|item| BlobMeta {
                name: item.name,
                updated: item.updated,
            }));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        tracing::debug!(prefix, count = blobs.len(), "listed blobs");
        Ok(blobs)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn object_list_parses_with_and_without_items() {
        let Ok(page) = serde_json::from_str::<ObjectList>(
            r#"{"items":[{"name":"u/s/a.png","updated":"2024-03-01T10:00:00.123Z"}],"nextPageToken":"abc"}"#,
        ) else {
            panic!("page should parse");
        };
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let Ok(empty) = serde_json::from_str::<ObjectList>("{}") else {
            panic!("empty page should parse");
        };
        assert!(empty.items.is_empty());
        assert!(empty.next_page_token.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = GcsBlobStore::new(
            reqwest::Client::new(),
            "https://storage.example.com/",
            "bucket",
            None,
        );
        assert_eq!(store.base_url, "https://storage.example.com");
    }
}
