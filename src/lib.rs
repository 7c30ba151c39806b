//! # mitta-api
//!
//! Data-access layer and REST API for user accounts, per-user settings,
//! spools (object-storage namespaces), sidekicks (search-index cores), an
//! expiring single-slot event queue, transaction markers, Slack webhook
//! dedup and signup gating.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + bearer auth (api/)
//!     │
//!     ├── Services (service/)
//!     │
//!     ├── Datastore (persistence/)   ── PostgreSQL | in-memory
//!     ├── BlobStore (storage/)       ── Cloud Storage | in-memory
//!     └── IndexProvisioner (index/)  ── Solr | no-op
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod persistence;
pub mod service;
pub mod storage;
