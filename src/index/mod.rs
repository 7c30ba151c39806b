//! Search index provisioning for sidekicks.
//!
//! [`IndexProvisioner::create_core`] asks the index instance at `host` to
//! create a core named after the sidekick. [`solr::SolrProvisioner`] uses
//! the Solr core admin API; [`NoopProvisioner`] skips provisioning.

pub mod solr;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::ServiceError;

pub use solr::SolrProvisioner;

/// Creates search cores on an index instance.
#[async_trait]
pub trait IndexProvisioner: Send + Sync + Debug {
    /// Creates core `name` on the instance at `host`.
    async fn create_core(&self, name: &str, host: &str) -> Result<(), ServiceError>;
}

/// Provisioner that accepts every request without contacting anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProvisioner;

#[async_trait]
impl IndexProvisioner for NoopProvisioner {
    async fn create_core(&self, name: &str, host: &str) -> Result<(), ServiceError> {
        tracing::debug!(core = name, host, "index provisioning disabled, skipping");
        Ok(())
    }
}
