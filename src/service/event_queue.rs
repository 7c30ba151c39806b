//! Expiring single-slot event queue.
//!
//! Producers deposit a short text for `(uid, pipe[, entity])`; consumers
//! pop the oldest entry for that key. Entries live for the configured TTL
//! (one minute by default). Expired entries are swept by every pop and by
//! a background task started with [`EventQueue::spawn_sweeper`].

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;

use super::require;
use crate::domain::{EventKey, EventReceipt, PoppedEvent, QueuedEvent};
use crate::error::ServiceError;
use crate::persistence::Datastore;

/// Longest honored entry lifetime, in seconds.
pub const MAX_EVENT_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Queue operations over the datastore's `events` collection.
#[derive(Debug, Clone)]
pub struct EventQueue {
    store: Arc<dyn Datastore>,
    ttl: Duration,
}

impl EventQueue {
    /// Creates a queue whose entries expire after `ttl_secs`, capped at
    /// [`MAX_EVENT_TTL_SECS`].
    #[must_use]
    pub fn new(store: Arc<dyn Datastore>, ttl_secs: u64) -> Self {
        let secs = ttl_secs.min(MAX_EVENT_TTL_SECS);
        let ttl = Duration::seconds(i64::try_from(secs).unwrap_or(0));
        Self { store, ttl }
    }

    fn cutoff(&self) -> DateTime<Utc> {
        Utc::now() - self.ttl
    }

    /// Deposits an entry and returns it with the creation time redacted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `uid` or `pipe`,
    /// or a datastore error.
    pub async fn create(
        &self,
        uid: &str,
        pipe: &str,
        entity: Option<&str>,
        text: Option<&str>,
    ) -> Result<EventReceipt, ServiceError> {
        require("uid", uid)?;
        require("pipe", pipe)?;

        let event = QueuedEvent::new(uid, pipe, entity, text);
        self.store.insert_event(&event).await?;
        tracing::debug!(eid = %event.eid, uid, pipe, "event queued");

        let stored = self
            .store
            .find_event(&event.eid)
            .await?
            .unwrap_or(event);
        Ok(stored.receipt())
    }

    /// Pops the oldest entry for `(uid, pipe)`, any entity.
    ///
    /// Sweeps expired entries for every key first.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn pop_by_uid_pipe(
        &self,
        uid: &str,
        pipe: &str,
    ) -> Result<Option<PoppedEvent>, ServiceError> {
        self.pop(EventKey {
            uid,
            pipe,
            entity: None,
        })
        .await
    }

    /// Pops the oldest entry for `(uid, pipe, entity)`.
    ///
    /// Sweeps expired entries for every key first.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn pop_by_uid_pipe_entity(
        &self,
        uid: &str,
        pipe: &str,
        entity: &str,
    ) -> Result<Option<PoppedEvent>, ServiceError> {
        self.pop(EventKey {
            uid,
            pipe,
            entity: Some(entity),
        })
        .await
    }

    async fn pop(&self, key: EventKey<'_>) -> Result<Option<PoppedEvent>, ServiceError> {
        let cutoff = self.cutoff();
        self.sweep_before(cutoff).await?;
        let taken = self.store.take_oldest_event(key, cutoff).await?;
        if let Some(event) = &taken {
            tracing::debug!(eid = %event.eid, uid = key.uid, pipe = key.pipe, "event popped");
        }
        Ok(taken.map(QueuedEvent::into_popped))
    }

    /// Deletes every expired entry and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn sweep_expired(&self) -> Result<u64, ServiceError> {
        self.sweep_before(self.cutoff()).await
    }

    async fn sweep_before(&self, cutoff: DateTime<Utc>) -> Result<u64, ServiceError> {
        let removed = self.store.delete_events_before(cutoff).await?;
        if removed > 0 {
            tracing::debug!(removed, "expired events swept");
        }
        Ok(removed)
    }

    /// Starts a task that sweeps expired entries every `interval`.
    ///
    /// Sweep failures are logged and the task keeps running.
    #[must_use]
    pub fn spawn_sweeper(&self, interval: StdDuration) -> JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = queue.sweep_expired().await {
                    tracing::warn!(error = %e, "event sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::queued_event::REDACTED_CREATED;
    use crate::persistence::{EventStore, MemoryDatastore};

    fn make_queue() -> (EventQueue, Arc<MemoryDatastore>) {
        let store = Arc::new(MemoryDatastore::new());
        (EventQueue::new(Arc::clone(&store) as _, 60), store)
    }

    #[tokio::test]
    async fn create_then_pop_returns_payload_once() {
        let (queue, _) = make_queue();
        let receipt =
            tokio_test::assert_ok!(queue.create("u1", "crawl", Some("page"), Some("hi")).await);
        assert_eq!(receipt.created, REDACTED_CREATED);

        let popped = tokio_test::assert_ok!(queue.pop_by_uid_pipe("u1", "crawl").await);
        let Some(popped) = popped else {
            panic!("expected an event");
        };
        assert_eq!(popped.pipe, "crawl");
        assert_eq!(popped.entity.as_deref(), Some("page"));
        assert_eq!(popped.text.as_deref(), Some("hi"));

        let again = tokio_test::assert_ok!(queue.pop_by_uid_pipe("u1", "crawl").await);
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn pop_returns_oldest_first() {
        let (queue, store) = make_queue();
        let mut older = QueuedEvent::new("u1", "p", None, Some("first"));
        older.created = Utc::now() - Duration::seconds(10);
        tokio_test::assert_ok!(store.insert_event(&older).await);
        tokio_test::assert_ok!(queue.create("u1", "p", None, Some("second")).await);

        let first = tokio_test::assert_ok!(queue.pop_by_uid_pipe("u1", "p").await);
        assert_eq!(first.and_then(|e| e.text).as_deref(), Some("first"));
        let second = tokio_test::assert_ok!(queue.pop_by_uid_pipe("u1", "p").await);
        assert_eq!(second.and_then(|e| e.text).as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn pop_by_entity_leaves_other_entities() {
        let (queue, store) = make_queue();
        tokio_test::assert_ok!(queue.create("u1", "p", Some("a"), Some("for a")).await);
        tokio_test::assert_ok!(queue.create("u1", "p", Some("b"), Some("for b")).await);

        let b = tokio_test::assert_ok!(queue.pop_by_uid_pipe_entity("u1", "p", "b").await);
        assert_eq!(b.and_then(|e| e.text).as_deref(), Some("for b"));
        assert_eq!(store.event_count().await, 1);

        let none = tokio_test::assert_ok!(queue.pop_by_uid_pipe_entity("u1", "p", "b").await);
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn pop_sweeps_expired_entries_for_unrelated_keys() {
        let (queue, store) = make_queue();
        let mut stale = QueuedEvent::new("someone-else", "other", None, Some("old"));
        stale.created = Utc::now() - Duration::seconds(61);
        tokio_test::assert_ok!(store.insert_event(&stale).await);
        let stale_eid = stale.eid.clone();

        let popped = tokio_test::assert_ok!(queue.pop_by_uid_pipe("u1", "p").await);
        assert!(popped.is_none());
        let found = tokio_test::assert_ok!(store.find_event(&stale_eid).await);
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn entity_pop_also_sweeps() {
        let (queue, store) = make_queue();
        let mut stale = QueuedEvent::new("u9", "x", Some("e"), None);
        stale.created = Utc::now() - Duration::minutes(3);
        tokio_test::assert_ok!(store.insert_event(&stale).await);

        tokio_test::assert_ok!(queue.pop_by_uid_pipe_entity("u1", "p", "e").await);
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn expired_entry_is_never_popped() {
        let (queue, store) = make_queue();
        let mut stale = QueuedEvent::new("u1", "p", None, Some("late"));
        stale.created = Utc::now() - Duration::seconds(90);
        tokio_test::assert_ok!(store.insert_event(&stale).await);

        let popped = tokio_test::assert_ok!(queue.pop_by_uid_pipe("u1", "p").await);
        assert!(popped.is_none());
    }

    #[tokio::test]
    async fn sweep_expired_counts_removed() {
        let (queue, store) = make_queue();
        let mut stale = QueuedEvent::new("u1", "p", None, None);
        stale.created = Utc::now() - Duration::minutes(2);
        tokio_test::assert_ok!(store.insert_event(&stale).await);
        tokio_test::assert_ok!(queue.create("u1", "p", None, None).await);

        let removed = tokio_test::assert_ok!(queue.sweep_expired().await);
        assert_eq!(removed, 1);
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn create_rejects_empty_pipe() {
        let (queue, _) = make_queue();
        let result = queue.create("u1", "  ", None, None).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn concurrent_pops_hand_out_one_entry_once() {
        let (queue, _) = make_queue();
        tokio_test::assert_ok!(queue.create("u1", "p", None, Some("only")).await);

        let (a, b) = tokio::join!(
            queue.pop_by_uid_pipe("u1", "p"),
            queue.pop_by_uid_pipe("u1", "p")
        );
        let a = tokio_test::assert_ok!(a);
        let b = tokio_test::assert_ok!(b);
        assert_eq!(usize::from(a.is_some()) + usize::from(b.is_some()), 1);
    }
}
