//! Service layer: one service per entity group.
//!
//! Services map each operation to datastore round trips and the external
//! adapters ([`crate::storage::BlobStore`], [`crate::index::IndexProvisioner`]),
//! validate natural keys and log state changes.

pub mod event_queue;
pub mod ledger_service;
pub mod settings_service;
pub mod sidekick_service;
pub mod signup_service;
pub mod spool_service;
pub mod user_service;

pub use event_queue::EventQueue;
pub use ledger_service::LedgerService;
pub use settings_service::SettingsService;
pub use sidekick_service::SidekickService;
pub use signup_service::SignupService;
pub use spool_service::SpoolService;
pub use user_service::UserService;

use crate::error::ServiceError;

/// Rejects a blank natural key.
pub(crate) fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
