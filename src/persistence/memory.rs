//! In-process datastore.
//!
//! Each collection is a `Vec` behind its own [`tokio::sync::RwLock`], kept
//! in insertion order. Reads of different collections never contend, and
//! every check-then-write happens under a single write guard, which gives
//! the same insert-if-absent and pop atomicity as the SQL adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    EventStore, LedgerStore, SettingsStore, SidekickStore, SignupStore, SpoolStore, Stored,
    UserStore,
};
use crate::domain::{
    EventKey, QueuedEvent, Setting, Sidekick, SidekickLookup, SlackEvent, Spool, SpoolLookup,
    Transaction, User, UserLookup, Version, WaitlistEntry,
};
use crate::error::ServiceError;

/// Datastore holding every collection in memory.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    users: RwLock<Vec<User>>,
    settings: RwLock<Vec<Setting>>,
    spools: RwLock<Vec<Spool>>,
    sidekicks: RwLock<Vec<Sidekick>>,
    events: RwLock<Vec<QueuedEvent>>,
    transactions: RwLock<Vec<Transaction>>,
    slack_events: RwLock<Vec<SlackEvent>>,
    waitlist: RwLock<Vec<WaitlistEntry>>,
    versions: RwLock<Vec<Version>>,
}

impl MemoryDatastore {
    /// Creates an empty datastore.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued events, expired or not.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

/// Inserts `record` unless `same_key` finds an existing one.
fn insert_if_absent<T: Clone>(
    rows: &mut Vec<T>,
    record: &T,
    same_key: impl Fn(&T) -> bool,
) -> Stored<T> {
    if let Some(existing) = rows.iter().find(|r| same_key(r)) {
        return Stored::existing(existing.clone());
    }
    rows.push(record.clone());
    Stored::created(record.clone())
}

/// Removes rows created before `cutoff`, returning how many went.
fn retain_since<T>(
    rows: &mut Vec<T>,
    cutoff: DateTime<Utc>,
    created: impl Fn(&T) -> DateTime<Utc>,
) -> u64 {
    let before = rows.len();
    rows.retain(|r| created(r) >= cutoff);
    u64::try_from(before - rows.len()).unwrap_or(u64::MAX)
}

/// Oldest row satisfying `pred`.
fn oldest<T: Clone>(
    rows: &[T],
    created: impl Fn(&T) -> DateTime<Utc>,
    pred: impl Fn(&T) -> bool,
) -> Option<T> {
    rows.iter()
        .filter(|r| pred(r))
        .min_by_key(|r| created(r))
        .cloned()
}

/// Rows satisfying `pred`, oldest first, at most `limit`.
fn sorted_limited<T: Clone>(
    rows: &[T],
    created: impl Fn(&T) -> DateTime<Utc>,
    pred: impl Fn(&T) -> bool,
    limit: u32,
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().filter(|r| pred(r)).cloned().collect();
    out.sort_by_key(|r| created(r));
    out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    out
}

#[async_trait]
impl UserStore for MemoryDatastore {
    async fn insert_user_if_absent(&self, user: &User) -> Result<Stored<User>, ServiceError> {
        let mut rows = self.users.write().await;
        if rows.iter().any(|u| u.uid == user.uid) {
            return Err(ServiceError::Conflict(format!("user {} already exists", user.uid)));
        }
        Ok(insert_if_absent(&mut *rows, user, |u| {
            u.email == user.email && u.phone == user.phone
        }))
    }

    async fn put_user(&self, user: &User) -> Result<bool, ServiceError> {
        let mut rows = self.users.write().await;
        match rows.iter_mut().find(|u| u.uid == user.uid) {
            Some(slot) => {
                *slot = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_user(&self, lookup: UserLookup<'_>) -> Result<Option<User>, ServiceError> {
        let rows = self.users.read().await;
        Ok(oldest(rows.as_slice(), |u| u.created, |u| lookup.matches(u)))
    }

    async fn list_users(
        &self,
        updated_before: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<User>, ServiceError> {
        let rows = self.users.read().await;
        Ok(sorted_limited(
            rows.as_slice(),
            |u| u.created,
            |u| updated_before.is_none_or(|cutoff| u.updated < cutoff),
            limit,
        ))
    }
}

#[async_trait]
impl SettingsStore for MemoryDatastore {
    async fn insert_setting_if_absent(
        &self,
        setting: &Setting,
    ) -> Result<Stored<Setting>, ServiceError> {
        let mut rows = self.settings.write().await;
        Ok(insert_if_absent(&mut *rows, setting, |s| {
            s.uid == setting.uid && s.name == setting.name
        }))
    }

    async fn upsert_setting(&self, setting: &Setting) -> Result<Setting, ServiceError> {
        let mut rows = self.settings.write().await;
        match rows
            .iter_mut()
            .find(|s| s.uid == setting.uid && s.name == setting.name)
        {
            Some(slot) => *slot = setting.clone(),
            None => rows.push(setting.clone()),
        }
        Ok(setting.clone())
    }

    async fn find_setting(&self, uid: &str, name: &str) -> Result<Option<Setting>, ServiceError> {
        let rows = self.settings.read().await;
        Ok(rows.iter().find(|s| s.uid == uid && s.name == name).cloned())
    }

    async fn list_settings(&self, uid: &str, limit: u32) -> Result<Vec<Setting>, ServiceError> {
        let rows = self.settings.read().await;
        let mut out: Vec<Setting> = rows.iter().filter(|s| s.uid == uid).cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }
}

#[async_trait]
impl SpoolStore for MemoryDatastore {
    async fn insert_spool(&self, spool: &Spool) -> Result<Spool, ServiceError> {
        let mut rows = self.spools.write().await;
        if rows.iter().any(|s| s.name == spool.name) {
            return Err(ServiceError::Conflict(format!("spool {} already exists", spool.name)));
        }
        rows.push(spool.clone());
        Ok(spool.clone())
    }

    async fn put_spool(&self, spool: &Spool) -> Result<bool, ServiceError> {
        let mut rows = self.spools.write().await;
        match rows.iter_mut().find(|s| s.name == spool.name) {
            Some(slot) => {
                *slot = spool.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_spool(&self, lookup: SpoolLookup<'_>) -> Result<Option<Spool>, ServiceError> {
        let rows = self.spools.read().await;
        Ok(oldest(rows.as_slice(), |s| s.created, |s| lookup.matches(s)))
    }

    async fn list_spools(
        &self,
        uid: Option<&str>,
        public: Option<bool>,
        limit: u32,
    ) -> Result<Vec<Spool>, ServiceError> {
        let rows = self.spools.read().await;
        Ok(sorted_limited(
            rows.as_slice(),
            |s| s.created,
            |s| uid.is_none_or(|u| s.uid == u) && public.is_none_or(|p| s.public == p),
            limit,
        ))
    }
}

#[async_trait]
impl SidekickStore for MemoryDatastore {
    async fn insert_sidekick(&self, sidekick: &Sidekick) -> Result<Sidekick, ServiceError> {
        let mut rows = self.sidekicks.write().await;
        if rows.iter().any(|s| s.name == sidekick.name) {
            return Err(ServiceError::Conflict(format!(
                "sidekick {} already exists",
                sidekick.name
            )));
        }
        rows.push(sidekick.clone());
        Ok(sidekick.clone())
    }

    async fn find_sidekick(
        &self,
        lookup: SidekickLookup<'_>,
    ) -> Result<Option<Sidekick>, ServiceError> {
        let rows = self.sidekicks.read().await;
        Ok(oldest(rows.as_slice(), |s| s.created, |s| lookup.matches(s)))
    }

    async fn list_sidekicks(&self, uid: &str, limit: u32) -> Result<Vec<Sidekick>, ServiceError> {
        let rows = self.sidekicks.read().await;
        Ok(sorted_limited(rows.as_slice(), |s| s.created, |s| s.uid == uid, limit))
    }
}

#[async_trait]
impl EventStore for MemoryDatastore {
    async fn insert_event(&self, event: &QueuedEvent) -> Result<(), ServiceError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn find_event(&self, eid: &str) -> Result<Option<QueuedEvent>, ServiceError> {
        let rows = self.events.read().await;
        Ok(rows.iter().find(|e| e.eid == eid).cloned())
    }

    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ServiceError> {
        let mut rows = self.events.write().await;
        Ok(retain_since(&mut *rows, cutoff, |e| e.created))
    }

    async fn take_oldest_event(
        &self,
        key: EventKey<'_>,
        not_before: DateTime<Utc>,
    ) -> Result<Option<QueuedEvent>, ServiceError> {
        let mut rows = self.events.write().await;
        let position = rows
            .iter()
            .enumerate()
            .filter(|(_, e)| e.created >= not_before && key.matches(e))
            .min_by_key(|(_, e)| e.created)
            .map(|(i, _)| i);
        Ok(position.map(|i| rows.remove(i)))
    }
}

#[async_trait]
impl LedgerStore for MemoryDatastore {
    async fn insert_transaction_if_absent(
        &self,
        tx: &Transaction,
    ) -> Result<Stored<Transaction>, ServiceError> {
        let mut rows = self.transactions.write().await;
        Ok(insert_if_absent(&mut *rows, tx, |t| t.tid == tx.tid))
    }

    async fn find_transaction(&self, tid: &str) -> Result<Option<Transaction>, ServiceError> {
        let rows = self.transactions.read().await;
        Ok(rows.iter().find(|t| t.tid == tid).cloned())
    }

    async fn list_transactions_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Transaction>, ServiceError> {
        let rows = self.transactions.read().await;
        Ok(sorted_limited(rows.as_slice(), |t| t.created, |t| t.created < cutoff, limit))
    }

    async fn delete_transactions_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let mut rows = self.transactions.write().await;
        Ok(retain_since(&mut *rows, cutoff, |t| t.created))
    }

    async fn insert_slack_event_if_absent(
        &self,
        event: &SlackEvent,
    ) -> Result<Stored<SlackEvent>, ServiceError> {
        let mut rows = self.slack_events.write().await;
        Ok(insert_if_absent(&mut *rows, event, |e| e.event_id == event.event_id))
    }

    async fn find_slack_event(&self, event_id: &str) -> Result<Option<SlackEvent>, ServiceError> {
        let rows = self.slack_events.read().await;
        Ok(rows.iter().find(|e| e.event_id == event_id).cloned())
    }

    async fn delete_slack_events_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let mut rows = self.slack_events.write().await;
        Ok(retain_since(&mut *rows, cutoff, |e| e.created))
    }
}

#[async_trait]
impl SignupStore for MemoryDatastore {
    async fn insert_waitlist_if_absent(
        &self,
        entry: &WaitlistEntry,
    ) -> Result<Stored<WaitlistEntry>, ServiceError> {
        let mut rows = self.waitlist.write().await;
        Ok(insert_if_absent(&mut *rows, entry, |w| w.email == entry.email))
    }

    async fn find_waitlist(
        &self,
        email: &str,
        allowed_only: bool,
    ) -> Result<Option<WaitlistEntry>, ServiceError> {
        let rows = self.waitlist.read().await;
        Ok(rows
            .iter()
            .find(|w| w.email == email && (w.allow || !allowed_only))
            .cloned())
    }

    async fn list_waitlist(&self, limit: u32) -> Result<Vec<WaitlistEntry>, ServiceError> {
        let rows = self.waitlist.read().await;
        Ok(sorted_limited(rows.as_slice(), |w| w.created, |_| true, limit))
    }

    async fn set_waitlist_allow(
        &self,
        email: &str,
        allow: bool,
    ) -> Result<Option<WaitlistEntry>, ServiceError> {
        let mut rows = self.waitlist.write().await;
        Ok(rows.iter_mut().find(|w| w.email == email).map(|w| {
            w.allow = allow;
            w.clone()
        }))
    }

    async fn insert_version_if_absent(
        &self,
        version: &Version,
    ) -> Result<Stored<Version>, ServiceError> {
        let mut rows = self.versions.write().await;
        Ok(insert_if_absent(&mut *rows, version, |v| v.name == version.name))
    }

    async fn find_version(
        &self,
        name: &str,
        allowed_only: bool,
    ) -> Result<Option<Version>, ServiceError> {
        let rows = self.versions.read().await;
        Ok(rows
            .iter()
            .find(|v| v.name == name && (v.allow || !allowed_only))
            .cloned())
    }

    async fn list_versions(&self, limit: u32) -> Result<Vec<Version>, ServiceError> {
        let rows = self.versions.read().await;
        Ok(sorted_limited(rows.as_slice(), |v| v.created, |_| true, limit))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn insert_if_absent_returns_existing() {
        let store = MemoryDatastore::new();
        let first = Setting::new("u1", "var1", serde_json::json!(1));
        let second = Setting::new("u1", "var1", serde_json::json!(2));

        let Ok(a) = store.insert_setting_if_absent(&first).await else {
            panic!("insert failed");
        };
        let Ok(b) = store.insert_setting_if_absent(&second).await else {
            panic!("insert failed");
        };
        assert!(a.created);
        assert!(!b.created);
        assert_eq!(b.record.value, serde_json::json!(1));
    }

    #[tokio::test]
    async fn take_oldest_skips_expired_and_removes() {
        let store = MemoryDatastore::new();
        let now = Utc::now();
        let mut stale = QueuedEvent::new("u1", "p", None, Some("stale"));
        stale.created = now - Duration::seconds(120);
        let fresh = QueuedEvent::new("u1", "p", None, Some("fresh"));
        tokio_test::assert_ok!(store.insert_event(&stale).await);
        tokio_test::assert_ok!(store.insert_event(&fresh).await);

        let key = EventKey {
            uid: "u1",
            pipe: "p",
            entity: None,
        };
        let taken = tokio_test::assert_ok!(
            store.take_oldest_event(key, now - Duration::seconds(60)).await
        );
        assert_eq!(taken.and_then(|e| e.text).as_deref(), Some("fresh"));
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn delete_events_before_counts() {
        let store = MemoryDatastore::new();
        let mut old = QueuedEvent::new("u1", "p", None, None);
        old.created = Utc::now() - Duration::minutes(5);
        tokio_test::assert_ok!(store.insert_event(&old).await);
        tokio_test::assert_ok!(store.insert_event(&QueuedEvent::new("u2", "p", None, None)).await);

        let removed = tokio_test::assert_ok!(
            store
                .delete_events_before(Utc::now() - Duration::minutes(1))
                .await
        );
        assert_eq!(removed, 1);
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn spool_name_clash_is_conflict() {
        let store = MemoryDatastore::new();
        let spool = Spool::new("u1", "t", None, false);
        tokio_test::assert_ok!(store.insert_spool(&spool).await);
        let again = store.insert_spool(&spool).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn list_spools_filters_visibility() {
        let store = MemoryDatastore::new();
        tokio_test::assert_ok!(store.insert_spool(&Spool::new("u1", "a", None, true)).await);
        tokio_test::assert_ok!(store.insert_spool(&Spool::new("u1", "b", None, false)).await);
        tokio_test::assert_ok!(store.insert_spool(&Spool::new("u2", "c", None, false)).await);

        let private = tokio_test::assert_ok!(store.list_spools(Some("u1"), Some(false), 100).await);
        assert_eq!(private.len(), 1);
        assert_eq!(private.first().map(|s| s.title.as_str()), Some("b"));
    }

    #[tokio::test]
    async fn waitlist_allowed_only() {
        let store = MemoryDatastore::new();
        let entry = WaitlistEntry::new("a@example.com", "A");
        tokio_test::assert_ok!(store.insert_waitlist_if_absent(&entry).await);

        let hidden = tokio_test::assert_ok!(store.find_waitlist("a@example.com", true).await);
        assert!(hidden.is_none());

        tokio_test::assert_ok!(store.set_waitlist_allow("a@example.com", true).await);
        let shown = tokio_test::assert_ok!(store.find_waitlist("a@example.com", true).await);
        assert!(shown.is_some_and(|w| w.allow));
    }
}
