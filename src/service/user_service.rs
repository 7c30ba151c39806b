//! User accounts: create-or-fetch, lookups and token rotation.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::naming::generate_token;
use crate::domain::user::{DEFAULT_EMAIL, NO_PHONE};
use crate::domain::{User, UserLookup};
use crate::error::ServiceError;
use crate::persistence::{Datastore, Stored, TASK_SCAN_LIMIT};

/// User operations.
#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<dyn Datastore>,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Returns the account for `(email, phone)`, creating it if needed.
    ///
    /// A blank email falls back to the no-reply address and a blank phone
    /// to the "no phone" placeholder.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn create(&self, email: &str, phone: &str) -> Result<User, ServiceError> {
        Ok(self.register(email, phone).await?.record)
    }

    /// Like [`UserService::create`], but reports whether the account is new.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn register(&self, email: &str, phone: &str) -> Result<Stored<User>, ServiceError> {
        let email = non_blank(email).unwrap_or(DEFAULT_EMAIL);
        let phone = non_blank(phone).unwrap_or(NO_PHONE);

        let stored = self
            .store
            .insert_user_if_absent(&User::new(email, phone))
            .await?;
        if stored.created {
            tracing::info!(uid = %stored.record.uid, "user created");
        }
        Ok(stored)
    }

    /// Rotates the API token of `uid` and returns the updated account.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for an unknown `uid`, or a
    /// datastore error.
    pub async fn token_reset(&self, uid: &str) -> Result<User, ServiceError> {
        let Some(mut user) = self.get_by_uid(uid).await? else {
            return Err(ServiceError::not_found("user", uid));
        };
        user.api_token = generate_token();
        user.updated = Utc::now();
        if !self.store.put_user(&user).await? {
            return Err(ServiceError::not_found("user", uid));
        }
        tracing::info!(uid, "api token rotated");
        Ok(user)
    }

    /// Looks a user up by `uid`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_uid(&self, uid: &str) -> Result<Option<User>, ServiceError> {
        self.store.find_user(UserLookup::Uid(uid)).await
    }

    /// Looks a user up by assigned name.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<User>, ServiceError> {
        self.store.find_user(UserLookup::Name(name)).await
    }

    /// Looks a user up by email.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        self.store.find_user(UserLookup::Email(email)).await
    }

    /// Looks a user up by phone.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_phone(&self, phone: &str) -> Result<Option<User>, ServiceError> {
        self.store.find_user(UserLookup::Phone(phone)).await
    }

    /// Looks a user up by pending mail confirmation token.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_mail_token(&self, token: &str) -> Result<Option<User>, ServiceError> {
        self.store.find_user(UserLookup::MailToken(token)).await
    }

    /// Looks a user up by API bearer token. A blank token never matches.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_token(&self, api_token: &str) -> Result<Option<User>, ServiceError> {
        if api_token.trim().is_empty() {
            return Ok(None);
        }
        self.store.find_user(UserLookup::ApiToken(api_token)).await
    }

    /// Looks a user up by Slack user and team id.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_by_slack_id_team(
        &self,
        slack_id: &str,
        team_id: &str,
    ) -> Result<Option<User>, ServiceError> {
        self.store
            .find_user(UserLookup::Slack { slack_id, team_id })
            .await
    }

    /// Users last updated before `before`.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_old(&self, before: DateTime<Utc>) -> Result<Vec<User>, ServiceError> {
        self.store.list_users(Some(before), TASK_SCAN_LIMIT).await
    }

    /// Every user, for background tasks.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn get_all_for_tasks(&self) -> Result<Vec<User>, ServiceError> {
        self.store.list_users(None, TASK_SCAN_LIMIT).await
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
