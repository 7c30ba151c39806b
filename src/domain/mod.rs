//! Domain layer: entity records, lookup keys and identifier generation.
//!
//! Every entity is a flat record. Lookup enums describe the equality
//! filters the datastore adapters must support; each carries a `matches`
//! predicate that the in-memory adapter evaluates directly.

pub mod ledger;
pub mod naming;
pub mod queued_event;
pub mod settings;
pub mod sidekick;
pub mod signup;
pub mod spool;
pub mod user;

pub use ledger::{SlackEvent, Transaction};
pub use queued_event::{EventKey, EventReceipt, PoppedEvent, QueuedEvent};
pub use settings::Setting;
pub use sidekick::{IndexPlacement, Sidekick, SidekickLookup};
pub use signup::{Version, WaitlistEntry};
pub use spool::{Spool, SpoolFile, SpoolLookup};
pub use user::{User, UserLookup};
