//! Transaction markers and inbound Slack event dedup.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;

use super::require;
use crate::domain::{SlackEvent, Transaction};
use crate::error::ServiceError;
use crate::persistence::{Datastore, Stored, TASK_SCAN_LIMIT};

/// Transaction and Slack event operations.
#[derive(Debug, Clone)]
pub struct LedgerService {
    store: Arc<dyn Datastore>,
}

impl LedgerService {
    /// Creates a new `LedgerService`.
    #[must_use]
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Returns transaction `tid`, recording it if unseen.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `tid`, or a
    /// datastore error.
    pub async fn create_transaction(
        &self,
        tid: &str,
        uid: Option<&str>,
    ) -> Result<Transaction, ServiceError> {
        require("tid", tid)?;
        let stored = self
            .store
            .insert_transaction_if_absent(&Transaction::new(tid, uid))
            .await?;
        if stored.created {
            tracing::info!(tid, "transaction recorded");
        }
        Ok(stored.record)
    }

    /// Transaction `tid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_transaction(&self, tid: &str) -> Result<Option<Transaction>, ServiceError> {
        self.store.find_transaction(tid).await
    }

    /// Transactions created before `before`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_old_transactions(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, ServiceError> {
        self.store
            .list_transactions_before(before, TASK_SCAN_LIMIT)
            .await
    }

    /// Deletes transactions created before `before`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn delete_old_transactions(&self, before: DateTime<Utc>) -> Result<u64, ServiceError> {
        let removed = self.store.delete_transactions_before(before).await?;
        tracing::info!(removed, "old transactions deleted");
        Ok(removed)
    }

    /// Records Slack event `event_id`.
    ///
    /// `created` on the result is `false` when the event was already seen,
    /// so webhook retries can be acknowledged without reprocessing.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `event_id`, or a
    /// datastore error.
    pub async fn create_slack_event(
        &self,
        event_time: i64,
        event_id: &str,
    ) -> Result<Stored<SlackEvent>, ServiceError> {
        require("event_id", event_id)?;
        let stored = self
            .store
            .insert_slack_event_if_absent(&SlackEvent::new(event_id, event_time))
            .await?;
        if stored.created {
            tracing::debug!(event_id, "slack event recorded");
        } else {
            tracing::debug!(event_id, "duplicate slack event");
        }
        Ok(stored)
    }

    /// Slack event `event_id`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_slack_event(&self, event_id: &str) -> Result<Option<SlackEvent>, ServiceError> {
        self.store.find_slack_event(event_id).await
    }

    /// Deletes Slack events recorded before `before`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn delete_old_slack_events(&self, before: DateTime<Utc>) -> Result<u64, ServiceError> {
        let removed = self.store.delete_slack_events_before(before).await?;
        tracing::info!(removed, "old slack events deleted");
        Ok(removed)
    }

    /// Deletes transactions and Slack events older than `retention`.
    ///
    /// Returns the number of transactions and Slack events removed.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn purge_older_than(&self, retention: Duration) -> Result<(u64, u64), ServiceError> {
        let before = Utc::now() - retention;
        let transactions = self.delete_old_transactions(before).await?;
        let slack_events = self.delete_old_slack_events(before).await?;
        Ok((transactions, slack_events))
    }

    /// Starts a task that runs [`Self::purge_older_than`] every `interval`.
    ///
    /// Failures are logged and the task keeps running.
    #[must_use]
    pub fn spawn_cleanup(&self, interval: StdDuration, retention: Duration) -> JoinHandle<()> {
        let ledger = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = ledger.purge_older_than(retention).await {
                    tracing::warn!(error = %e, "ledger cleanup failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{LedgerStore, MemoryDatastore};

    fn make_service() -> (LedgerService, Arc<MemoryDatastore>) {
        let store = Arc::new(MemoryDatastore::new());
        (LedgerService::new(Arc::clone(&store) as _), store)
    }

    #[tokio::test]
    async fn transaction_create_is_idempotent() {
        let (svc, _) = make_service();
        let first = tokio_test::assert_ok!(svc.create_transaction("tx-1", Some("u1")).await);
        let second = tokio_test::assert_ok!(svc.create_transaction("tx-1", Some("u2")).await);
        assert_eq!(first, second);
        assert_eq!(second.uid.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn old_transactions_listed_and_deleted() {
        let (svc, store) = make_service();
        let mut old = Transaction::new("tx-old", None);
        old.created = Utc::now() - Duration::days(2);
        tokio_test::assert_ok!(store.insert_transaction_if_absent(&old).await);
        tokio_test::assert_ok!(svc.create_transaction("tx-new", None).await);

        let cutoff = Utc::now() - Duration::days(1);
        let listed = tokio_test::assert_ok!(svc.get_old_transactions(cutoff).await);
        assert_eq!(listed.len(), 1);

        let removed = tokio_test::assert_ok!(svc.delete_old_transactions(cutoff).await);
        assert_eq!(removed, 1);
        let gone = tokio_test::assert_ok!(svc.get_transaction("tx-old").await);
        assert!(gone.is_none());
        let kept = tokio_test::assert_ok!(svc.get_transaction("tx-new").await);
        assert!(kept.is_some());
    }

    #[tokio::test]
    async fn slack_event_reports_duplicates() {
        let (svc, _) = make_service();
        let first = tokio_test::assert_ok!(svc.create_slack_event(1_700_000_000, "Ev01").await);
        assert!(first.created);
        let again = tokio_test::assert_ok!(svc.create_slack_event(1_700_000_000, "Ev01").await);
        assert!(!again.created);
        assert_eq!(again.record.event_id, "Ev01");
    }

    #[tokio::test]
    async fn old_slack_events_deleted() {
        let (svc, store) = make_service();
        let mut old = SlackEvent::new("Ev-old", 1);
        old.created = Utc::now() - Duration::hours(3);
        tokio_test::assert_ok!(store.insert_slack_event_if_absent(&old).await);
        tokio_test::assert_ok!(svc.create_slack_event(2, "Ev-new").await);

        let removed =
            tokio_test::assert_ok!(svc.delete_old_slack_events(Utc::now() - Duration::hours(1)).await);
        assert_eq!(removed, 1);
        let kept = tokio_test::assert_ok!(svc.get_slack_event("Ev-new").await);
        assert!(kept.is_some());
    }

    #[tokio::test]
    async fn purge_drops_both_kinds_past_retention() {
        let (svc, store) = make_service();
        let mut old_tx = Transaction::new("tx-stale", Some("u1"));
        old_tx.created = Utc::now() - Duration::days(40);
        tokio_test::assert_ok!(store.insert_transaction_if_absent(&old_tx).await);
        let mut old_ev = SlackEvent::new("Ev-stale", 1);
        old_ev.created = Utc::now() - Duration::days(40);
        tokio_test::assert_ok!(store.insert_slack_event_if_absent(&old_ev).await);
        tokio_test::assert_ok!(svc.create_transaction("tx-fresh", Some("u1")).await);
        tokio_test::assert_ok!(svc.create_slack_event(2, "Ev-fresh").await);

        let removed = tokio_test::assert_ok!(svc.purge_older_than(Duration::days(30)).await);
        assert_eq!(removed, (1, 1));
        assert!(tokio_test::assert_ok!(svc.get_transaction("tx-fresh").await).is_some());
        assert!(tokio_test::assert_ok!(svc.get_slack_event("Ev-fresh").await).is_some());
        assert!(tokio_test::assert_ok!(svc.get_slack_event("Ev-stale").await).is_none());
    }

    #[tokio::test]
    async fn cleanup_task_purges_on_first_tick() {
        let (svc, store) = make_service();
        let mut old_tx = Transaction::new("tx-stale", None);
        old_tx.created = Utc::now() - Duration::days(40);
        tokio_test::assert_ok!(store.insert_transaction_if_absent(&old_tx).await);

        let task = svc.spawn_cleanup(StdDuration::from_secs(3600), Duration::days(30));
        let mut purged = false;
        for _ in 0..50 {
            if tokio_test::assert_ok!(svc.get_transaction("tx-stale").await).is_none() {
                purged = true;
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        task.abort();
        assert!(purged);
    }

    #[tokio::test]
    async fn empty_keys_rejected() {
        let (svc, _) = make_service();
        assert!(matches!(
            svc.create_transaction("", None).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.create_slack_event(0, " ").await,
            Err(ServiceError::Validation(_))
        ));
    }
}
