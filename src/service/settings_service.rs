//! Per-user settings.

use std::sync::Arc;

use super::require;
use crate::domain::Setting;
use crate::error::ServiceError;
use crate::persistence::Datastore;

/// Settings operations.
#[derive(Debug, Clone)]
pub struct SettingsService {
    store: Arc<dyn Datastore>,
    list_limit: u32,
}

impl SettingsService {
    /// Creates a service returning at most `list_limit` settings per listing.
    #[must_use]
    pub fn new(store: Arc<dyn Datastore>, list_limit: u32) -> Self {
        Self { store, list_limit }
    }

    /// Returns setting `(uid, name)`, creating it with `value` if absent.
    ///
    /// An existing setting keeps its stored value.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `uid` or `name`,
    /// or a datastore error.
    pub async fn create(
        &self,
        uid: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<Setting, ServiceError> {
        require("uid", uid)?;
        require("name", name)?;
        let stored = self
            .store
            .insert_setting_if_absent(&Setting::new(uid, name, value))
            .await?;
        if stored.created {
            tracing::info!(uid, name, "setting created");
        }
        Ok(stored.record)
    }

    /// Writes `value` to `(uid, name)`, creating the setting if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `uid` or `name`,
    /// or a datastore error.
    pub async fn put(
        &self,
        uid: &str,
        name: &str,
        value: serde_json::Value,
    ) -> Result<Setting, ServiceError> {
        require("uid", uid)?;
        require("name", name)?;
        let setting = self
            .store
            .upsert_setting(&Setting::new(uid, name, value))
            .await?;
        tracing::info!(uid, name, "setting written");
        Ok(setting)
    }

    /// The setting `(uid, name)`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_uid_name(
        &self,
        uid: &str,
        name: &str,
    ) -> Result<Option<Setting>, ServiceError> {
        self.store.find_setting(uid, name).await
    }

    /// Settings of `uid`, capped at the configured limit.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_all(&self, uid: &str) -> Result<Vec<Setting>, ServiceError> {
        self.store.list_settings(uid, self.list_limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryDatastore;
    use serde_json::json;

    fn make_service(limit: u32) -> SettingsService {
        SettingsService::new(Arc::new(MemoryDatastore::new()), limit)
    }

    #[tokio::test]
    async fn create_keeps_first_value() {
        let svc = make_service(10);
        let first = tokio_test::assert_ok!(svc.create("u1", "theme", json!("dark")).await);
        let second = tokio_test::assert_ok!(svc.create("u1", "theme", json!("light")).await);
        assert_eq!(first.value, json!("dark"));
        assert_eq!(second.value, json!("dark"));
    }

    #[tokio::test]
    async fn put_overwrites_value() {
        let svc = make_service(10);
        tokio_test::assert_ok!(svc.create("u1", "theme", json!("dark")).await);
        tokio_test::assert_ok!(svc.put("u1", "theme", json!({"mode": "light"})).await);

        let found = tokio_test::assert_ok!(svc.get_by_uid_name("u1", "theme").await);
        assert_eq!(found.map(|s| s.value), Some(json!({"mode": "light"})));
    }

    #[tokio::test]
    async fn get_all_honours_limit_and_owner() {
        let svc = make_service(2);
        for name in ["a", "b", "c"] {
            tokio_test::assert_ok!(svc.create("u1", name, json!(1)).await);
        }
        tokio_test::assert_ok!(svc.create("u2", "z", json!(1)).await);

        let listed = tokio_test::assert_ok!(svc.get_all("u1").await);
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|s| s.uid == "u1"));
    }

    #[tokio::test]
    async fn create_rejects_empty_name() {
        let svc = make_service(10);
        let result = svc.create("u1", "", json!(null)).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
