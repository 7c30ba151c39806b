//! In-process blob listing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BlobMeta, BlobStore};
use crate::error::ServiceError;

/// Blob store holding object names and update times in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<Vec<BlobMeta>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an object, replacing any previous one with the same name.
    pub async fn put(&self, name: impl Into<String>, updated: DateTime<Utc>) {
        let name = name.into();
        let mut blobs = self.blobs.write().await;
        blobs.retain(|b| b.name != name);
        blobs.push(BlobMeta { name, updated });
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list_blobs(&self, prefix: &str) -> Result<Vec<BlobMeta>, ServiceError> {
        let blobs = self.blobs.read().await;
        let mut listed: Vec<BlobMeta> = blobs
            .iter()
            .filter(|b| b.name.starts_with(prefix))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_by_prefix_in_name_order() {
        let store = MemoryBlobStore::new();
        let now = Utc::now();
        store.put("u1/spool_a/b.png", now).await;
        store.put("u1/spool_a/a.png", now).await;
        store.put("u1/spool_b/c.png", now).await;

        let listed = tokio_test::assert_ok!(store.list_blobs("u1/spool_a").await);
        let names: Vec<&str> = listed.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["u1/spool_a/a.png", "u1/spool_a/b.png"]);
    }

    #[tokio::test]
    async fn put_replaces_same_name() {
        let store = MemoryBlobStore::new();
        let now = Utc::now();
        store.put("u1/s/a", now).await;
        store.put("u1/s/a", now).await;
        let listed = tokio_test::assert_ok!(store.list_blobs("u1/s").await);
        assert_eq!(listed.len(), 1);
    }
}
