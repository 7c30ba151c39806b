//! Signup gating: the waitlist and allowed release versions.

use std::sync::Arc;

use super::require;
use crate::domain::{Version, WaitlistEntry};
use crate::error::ServiceError;
use crate::persistence::Datastore;

/// Entries returned by the waitlist and version listings.
pub const SIGNUP_LIST_LIMIT: u32 = 200;

/// Waitlist and version operations.
#[derive(Debug, Clone)]
pub struct SignupService {
    store: Arc<dyn Datastore>,
}

impl SignupService {
    /// Creates a new `SignupService`.
    #[must_use]
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Returns the waitlist entry for `email`, adding a disallowed one if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `email`, or a
    /// datastore error.
    pub async fn create_waitlist(
        &self,
        email: &str,
        name: &str,
    ) -> Result<WaitlistEntry, ServiceError> {
        require("email", email)?;
        let stored = self
            .store
            .insert_waitlist_if_absent(&WaitlistEntry::new(email, name))
            .await?;
        if stored.created {
            tracing::info!(email, "waitlist entry added");
        }
        Ok(stored.record)
    }

    /// Oldest waitlist entries.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_waitlist(&self) -> Result<Vec<WaitlistEntry>, ServiceError> {
        self.store.list_waitlist(SIGNUP_LIST_LIMIT).await
    }

    /// Waitlist entry for `email`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_waitlist_by_email(
        &self,
        email: &str,
    ) -> Result<Option<WaitlistEntry>, ServiceError> {
        self.store.find_waitlist(email, false).await
    }

    /// Waitlist entry for `email`, only if it has been allowed in.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_allowed_waitlist_by_email(
        &self,
        email: &str,
    ) -> Result<Option<WaitlistEntry>, ServiceError> {
        self.store.find_waitlist(email, true).await
    }

    /// Allows or disallows the waitlist entry for `email`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unknown email, or a
    /// datastore error.
    pub async fn set_allow(&self, email: &str, allow: bool) -> Result<WaitlistEntry, ServiceError> {
        let Some(entry) = self.store.set_waitlist_allow(email, allow).await? else {
            return Err(ServiceError::not_found("waitlist entry", email));
        };
        tracing::info!(email, allow, "waitlist entry updated");
        Ok(entry)
    }

    /// Returns version `name`, adding a disallowed one if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `name`, or a
    /// datastore error.
    pub async fn create_version(&self, name: &str) -> Result<Version, ServiceError> {
        require("name", name)?;
        let stored = self
            .store
            .insert_version_if_absent(&Version::new(name))
            .await?;
        if stored.created {
            tracing::info!(name, "version added");
        }
        Ok(stored.record)
    }

    /// Oldest versions.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_versions(&self) -> Result<Vec<Version>, ServiceError> {
        self.store.list_versions(SIGNUP_LIST_LIMIT).await
    }

    /// Version `name`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_version_by_name(&self, name: &str) -> Result<Option<Version>, ServiceError> {
        self.store.find_version(name, false).await
    }

    /// Version `name`, only if it is allowed.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_allowed_version_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Version>, ServiceError> {
        self.store.find_version(name, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryDatastore;

    fn make_service() -> SignupService {
        SignupService::new(Arc::new(MemoryDatastore::new()))
    }

    #[tokio::test]
    async fn waitlist_create_or_fetch() {
        let svc = make_service();
        let first = tokio_test::assert_ok!(svc.create_waitlist("a@example.com", "Ann").await);
        let again = tokio_test::assert_ok!(svc.create_waitlist("a@example.com", "Other").await);
        assert!(!first.allow);
        assert_eq!(again.name, "Ann");
        let all = tokio_test::assert_ok!(svc.get_waitlist().await);
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn allowed_lookup_follows_set_allow() {
        let svc = make_service();
        tokio_test::assert_ok!(svc.create_waitlist("a@example.com", "Ann").await);
        let hidden = tokio_test::assert_ok!(svc.get_allowed_waitlist_by_email("a@example.com").await);
        assert!(hidden.is_none());

        let entry = tokio_test::assert_ok!(svc.set_allow("a@example.com", true).await);
        assert!(entry.allow);
        let shown = tokio_test::assert_ok!(svc.get_allowed_waitlist_by_email("a@example.com").await);
        assert!(shown.is_some());
        let plain = tokio_test::assert_ok!(svc.get_waitlist_by_email("a@example.com").await);
        assert!(plain.is_some());
    }

    #[tokio::test]
    async fn set_allow_unknown_email_is_not_found() {
        let svc = make_service();
        let result = svc.set_allow("ghost@example.com", true).await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn versions_keyed_by_name() {
        let svc = make_service();
        let v = tokio_test::assert_ok!(svc.create_version("2024.1").await);
        assert!(!v.allow);
        tokio_test::assert_ok!(svc.create_version("2024.1").await);

        let listed = tokio_test::assert_ok!(svc.get_versions().await);
        assert_eq!(listed.len(), 1);
        let found = tokio_test::assert_ok!(svc.get_version_by_name("2024.1").await);
        assert!(found.is_some());
        let allowed = tokio_test::assert_ok!(svc.get_allowed_version_by_name("2024.1").await);
        assert!(allowed.is_none());
    }
}
