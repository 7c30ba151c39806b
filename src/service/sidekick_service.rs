//! Sidekicks: provision a search core, then record it.

use std::sync::Arc;

use super::require;
use crate::domain::settings::SIDEKICK_SETTING;
use crate::domain::{IndexPlacement, Sidekick, SidekickLookup};
use crate::error::ServiceError;
use crate::index::IndexProvisioner;
use crate::persistence::{Datastore, TASK_SCAN_LIMIT};

/// Sidekicks returned per user listing.
pub const USER_SIDEKICK_LIMIT: u32 = 20;

/// Sidekick operations.
#[derive(Debug, Clone)]
pub struct SidekickService {
    store: Arc<dyn Datastore>,
    index: Arc<dyn IndexProvisioner>,
    placement: IndexPlacement,
}

impl SidekickService {
    /// Creates a service placing new cores on `placement`.
    #[must_use]
    pub fn new(
        store: Arc<dyn Datastore>,
        index: Arc<dyn IndexProvisioner>,
        placement: IndexPlacement,
    ) -> Self {
        Self {
            store,
            index,
            placement,
        }
    }

    /// Provisions a core for a new sidekick and stores its record.
    ///
    /// Nothing is stored when provisioning fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for an empty `uid`,
    /// [`ServiceError::Provisioning`] when the index rejects the core, or a
    /// datastore error.
    pub async fn create(&self, uid: &str, title: &str) -> Result<Sidekick, ServiceError> {
        require("uid", uid)?;
        let sidekick = Sidekick::new(uid, title, &self.placement);

        self.index
            .create_core(&sidekick.name, &sidekick.instance_ip)
            .await?;

        let sidekick = self.store.insert_sidekick(&sidekick).await?;
        tracing::info!(
            uid,
            name = %sidekick.name,
            nick = %sidekick.nick,
            instance = %sidekick.instance_name,
            "sidekick created"
        );
        Ok(sidekick)
    }

    /// Sidekick with `nick`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_nick(&self, nick: &str) -> Result<Option<Sidekick>, ServiceError> {
        self.store.find_sidekick(SidekickLookup::Nick(nick)).await
    }

    /// Sidekick `name` owned by `uid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_uid_name(
        &self,
        uid: &str,
        name: &str,
    ) -> Result<Option<Sidekick>, ServiceError> {
        self.store
            .find_sidekick(SidekickLookup::UidName { uid, name })
            .await
    }

    /// Sidekick `nick` owned by `uid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_uid_nick(
        &self,
        uid: &str,
        nick: &str,
    ) -> Result<Option<Sidekick>, ServiceError> {
        self.store
            .find_sidekick(SidekickLookup::UidNick { uid, nick })
            .await
    }

    /// The default sidekick named by the user's `sidekick` setting.
    ///
    /// Only sidekicks owned by `uid` are considered.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_user(&self, uid: &str) -> Result<Option<Sidekick>, ServiceError> {
        let Some(setting) = self.store.find_setting(uid, SIDEKICK_SETTING).await? else {
            return Ok(None);
        };
        let Some(nick) = setting.value_as_str() else {
            tracing::debug!(uid, "sidekick setting is not a string");
            return Ok(None);
        };
        self.get_by_uid_nick(uid, &nick).await
    }

    /// Every sidekick of `uid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_all(&self, uid: &str) -> Result<Vec<Sidekick>, ServiceError> {
        self.store.list_sidekicks(uid, TASK_SCAN_LIMIT).await
    }

    /// Sidekicks of `uid`, at most [`USER_SIDEKICK_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_user_all(&self, uid: &str) -> Result<Vec<Sidekick>, ServiceError> {
        self.store.list_sidekicks(uid, USER_SIDEKICK_LIMIT).await
    }
}
