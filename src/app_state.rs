//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::domain::IndexPlacement;
use crate::index::IndexProvisioner;
use crate::persistence::Datastore;
use crate::service::{
    EventQueue, LedgerService, SettingsService, SidekickService, SignupService, SpoolService,
    UserService,
};
use crate::storage::BlobStore;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Accounts and bearer-token lookup.
    pub users: Arc<UserService>,
    /// Per-user settings.
    pub settings: Arc<SettingsService>,
    /// Spools and their blob listings.
    pub spools: Arc<SpoolService>,
    /// Sidekicks and index provisioning.
    pub sidekicks: Arc<SidekickService>,
    /// Expiring event queue.
    pub events: Arc<EventQueue>,
    /// Transactions and Slack dedup.
    pub ledger: Arc<LedgerService>,
    /// Waitlist and versions.
    pub signup: Arc<SignupService>,
}

impl AppState {
    /// Wires every service onto the given adapters.
    #[must_use]
    pub fn new(
        store: Arc<dyn Datastore>,
        blobs: Arc<dyn BlobStore>,
        index: Arc<dyn IndexProvisioner>,
        config: &ServiceConfig,
    ) -> Self {
        let placement = IndexPlacement {
            instance_name: config.index_instance_name.clone(),
            instance_ip: config.index_instance_ip.clone(),
            region: config.index_region.clone(),
        };
        Self {
            users: Arc::new(UserService::new(Arc::clone(&store))),
            settings: Arc::new(SettingsService::new(
                Arc::clone(&store),
                config.settings_list_limit,
            )),
            spools: Arc::new(SpoolService::new(Arc::clone(&store), blobs)),
            sidekicks: Arc::new(SidekickService::new(Arc::clone(&store), index, placement)),
            events: Arc::new(EventQueue::new(Arc::clone(&store), config.event_ttl_secs)),
            ledger: Arc::new(LedgerService::new(Arc::clone(&store))),
            signup: Arc::new(SignupService::new(store)),
        }
    }
}
