//! Object storage: listing blobs under a spool's prefix.
//!
//! [`BlobStore`] is the only operation the service needs from the bucket.
//! [`gcs::GcsBlobStore`] talks to the Cloud Storage JSON API;
//! [`memory::MemoryBlobStore`] backs local runs and tests.

pub mod gcs;
pub mod memory;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ServiceError;

pub use gcs::GcsBlobStore;
pub use memory::MemoryBlobStore;

/// Name and last-update time of one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMeta {
    /// Full object name including the prefix.
    pub name: String,
    /// Last update time.
    pub updated: DateTime<Utc>,
}

/// Read access to the spool bucket.
#[async_trait]
pub trait BlobStore: Send + Sync + Debug {
    /// Every object whose name starts with `prefix`, in listing order.
    async fn list_blobs(&self, prefix: &str) -> Result<Vec<BlobMeta>, ServiceError>;
}
