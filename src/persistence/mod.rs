//! Persistence layer: the datastore port and its adapters.
//!
//! Each entity group has a store trait; [`Datastore`] bundles them so the
//! services share one `Arc<dyn Datastore>`. Lookups return `Ok(None)` on
//! absence and [`ServiceError::Backend`] when the store itself fails.
//!
//! Create-or-fetch goes through the `insert_*_if_absent` methods, which
//! must be atomic with respect to the entity's natural key.
//!
//! Adapters: [`postgres::PostgresDatastore`] (sqlx) and
//! [`memory::MemoryDatastore`] (in-process, for local runs and tests).

pub mod memory;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    EventKey, QueuedEvent, Setting, Sidekick, SidekickLookup, SlackEvent, Spool, SpoolLookup,
    Transaction, User, UserLookup, Version, WaitlistEntry,
};
use crate::error::ServiceError;

pub use memory::MemoryDatastore;
pub use postgres::PostgresDatastore;

/// Row cap for the "everything, for background tasks" listings.
pub const TASK_SCAN_LIMIT: u32 = 10_000;

/// Result of an insert-if-absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    /// The canonical stored record (new or pre-existing).
    pub record: T,
    /// `true` when this call inserted the record.
    pub created: bool,
}

impl<T> Stored<T> {
    /// Wraps a freshly inserted record.
    pub const fn created(record: T) -> Self {
        Self {
            record,
            created: true,
        }
    }

    /// Wraps a record that already existed.
    pub const fn existing(record: T) -> Self {
        Self {
            record,
            created: false,
        }
    }
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts `user` unless one with the same email and phone exists.
    async fn insert_user_if_absent(&self, user: &User) -> Result<Stored<User>, ServiceError>;

    /// Rewrites the user with `user.uid`. Returns `false` if none exists.
    async fn put_user(&self, user: &User) -> Result<bool, ServiceError>;

    /// Oldest user matching `lookup`.
    async fn find_user(&self, lookup: UserLookup<'_>) -> Result<Option<User>, ServiceError>;

    /// Users ordered by creation, optionally only those updated before a cutoff.
    async fn list_users(
        &self,
        updated_before: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<User>, ServiceError>;
}

/// Per-user settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Inserts `setting` unless `(uid, name)` exists.
    async fn insert_setting_if_absent(
        &self,
        setting: &Setting,
    ) -> Result<Stored<Setting>, ServiceError>;

    /// Inserts or overwrites `(uid, name)`, returning the stored row.
    async fn upsert_setting(&self, setting: &Setting) -> Result<Setting, ServiceError>;

    /// The setting `(uid, name)`.
    async fn find_setting(&self, uid: &str, name: &str) -> Result<Option<Setting>, ServiceError>;

    /// Settings of `uid`, by name.
    async fn list_settings(&self, uid: &str, limit: u32) -> Result<Vec<Setting>, ServiceError>;
}

/// Spools.
#[async_trait]
pub trait SpoolStore: Send + Sync {
    /// Inserts a new spool. Fails with [`ServiceError::Conflict`] on a name clash.
    async fn insert_spool(&self, spool: &Spool) -> Result<Spool, ServiceError>;

    /// Rewrites the spool with `spool.name`. Returns `false` if none exists.
    async fn put_spool(&self, spool: &Spool) -> Result<bool, ServiceError>;

    /// Oldest spool matching `lookup`.
    async fn find_spool(&self, lookup: SpoolLookup<'_>) -> Result<Option<Spool>, ServiceError>;

    /// Spools ordered by creation, filtered by owner and visibility.
    async fn list_spools(
        &self,
        uid: Option<&str>,
        public: Option<bool>,
        limit: u32,
    ) -> Result<Vec<Spool>, ServiceError>;
}

/// Sidekicks.
#[async_trait]
pub trait SidekickStore: Send + Sync {
    /// Inserts a new sidekick. Fails with [`ServiceError::Conflict`] on a name clash.
    async fn insert_sidekick(&self, sidekick: &Sidekick) -> Result<Sidekick, ServiceError>;

    /// Oldest sidekick matching `lookup`.
    async fn find_sidekick(
        &self,
        lookup: SidekickLookup<'_>,
    ) -> Result<Option<Sidekick>, ServiceError>;

    /// Sidekicks of `uid` ordered by creation.
    async fn list_sidekicks(&self, uid: &str, limit: u32) -> Result<Vec<Sidekick>, ServiceError>;
}

/// The expiring event queue.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends an entry.
    async fn insert_event(&self, event: &QueuedEvent) -> Result<(), ServiceError>;

    /// The entry with `eid`.
    async fn find_event(&self, eid: &str) -> Result<Option<QueuedEvent>, ServiceError>;

    /// Deletes every entry created before `cutoff`; returns how many.
    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ServiceError>;

    /// Atomically removes and returns the oldest entry matching `key`
    /// created at or after `not_before`.
    async fn take_oldest_event(
        &self,
        key: EventKey<'_>,
        not_before: DateTime<Utc>,
    ) -> Result<Option<QueuedEvent>, ServiceError>;
}

/// Transactions and Slack dedup markers.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts `tx` unless `tid` exists.
    async fn insert_transaction_if_absent(
        &self,
        tx: &Transaction,
    ) -> Result<Stored<Transaction>, ServiceError>;

    /// The transaction `tid`.
    async fn find_transaction(&self, tid: &str) -> Result<Option<Transaction>, ServiceError>;

    /// Transactions created before `cutoff`, oldest first.
    async fn list_transactions_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Transaction>, ServiceError>;

    /// Deletes transactions created before `cutoff`; returns how many.
    async fn delete_transactions_before(&self, cutoff: DateTime<Utc>)
    -> Result<u64, ServiceError>;

    /// Inserts `event` unless `event_id` exists.
    async fn insert_slack_event_if_absent(
        &self,
        event: &SlackEvent,
    ) -> Result<Stored<SlackEvent>, ServiceError>;

    /// The Slack marker `event_id`.
    async fn find_slack_event(&self, event_id: &str) -> Result<Option<SlackEvent>, ServiceError>;

    /// Deletes Slack markers created before `cutoff`; returns how many.
    async fn delete_slack_events_before(&self, cutoff: DateTime<Utc>)
    -> Result<u64, ServiceError>;
}

/// Waitlist and versions.
#[async_trait]
pub trait SignupStore: Send + Sync {
    /// Inserts `entry` unless `email` exists.
    async fn insert_waitlist_if_absent(
        &self,
        entry: &WaitlistEntry,
    ) -> Result<Stored<WaitlistEntry>, ServiceError>;

    /// The entry for `email`, optionally only if allowed.
    async fn find_waitlist(
        &self,
        email: &str,
        allowed_only: bool,
    ) -> Result<Option<WaitlistEntry>, ServiceError>;

    /// Entries ordered by creation.
    async fn list_waitlist(&self, limit: u32) -> Result<Vec<WaitlistEntry>, ServiceError>;

    /// Sets `allow` on the entry for `email`, returning the updated entry.
    async fn set_waitlist_allow(
        &self,
        email: &str,
        allow: bool,
    ) -> Result<Option<WaitlistEntry>, ServiceError>;

    /// Inserts `version` unless `name` exists.
    async fn insert_version_if_absent(
        &self,
        version: &Version,
    ) -> Result<Stored<Version>, ServiceError>;

    /// The version `name`, optionally only if allowed.
    async fn find_version(
        &self,
        name: &str,
        allowed_only: bool,
    ) -> Result<Option<Version>, ServiceError>;

    /// Versions ordered by creation.
    async fn list_versions(&self, limit: u32) -> Result<Vec<Version>, ServiceError>;
}

/// Every store the services need, behind one trait object.
pub trait Datastore:
    UserStore
    + SettingsStore
    + SpoolStore
    + SidekickStore
    + EventStore
    + LedgerStore
    + SignupStore
    + Debug
{
}

impl<T> Datastore for T where
    T: UserStore
        + SettingsStore
        + SpoolStore
        + SidekickStore
        + EventStore
        + LedgerStore
        + SignupStore
        + Debug
{
}
