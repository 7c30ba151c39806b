//! User accounts: identity, auth tokens and account status flags.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::naming::{ID_LEN, generate_token, random_name, random_string};

/// Phone value meaning "no phone number on file".
pub const NO_PHONE: &str = "+1";

/// Email used when an account is created without one.
pub const DEFAULT_EMAIL: &str = "noreply@mitta.us";

/// Days until a fresh account expires.
pub const ACCOUNT_TTL_DAYS: i64 = 15;

/// A user account.
///
/// `uid` is the external-facing key. The token fields are secrets and
/// never leave the service except through the dedicated token endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// External-facing user identifier.
    pub uid: String,
    /// Assigned human-readable name.
    pub name: String,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last update timestamp.
    pub updated: DateTime<Utc>,
    /// Account expiry.
    pub expires: DateTime<Utc>,
    /// May create command sidekicks.
    pub admin: bool,

    /// Email address.
    pub email: String,
    /// Phone number, [`NO_PHONE`] when absent.
    pub phone: String,
    /// Pending phone verification code.
    pub phone_code: Option<String>,
    /// Consecutive failed second-factor attempts.
    pub failed_2fa_attempts: i32,

    /// Pending email confirmation token.
    pub mail_token: Option<String>,
    /// Email address confirmed.
    pub mail_confirm: bool,
    /// Confirmation mails sent.
    pub mail_tries: i32,

    /// Session authenticated.
    pub authenticated: bool,
    /// Account active.
    pub active: bool,
    /// Anonymous account.
    pub anonymous: bool,
    /// Paying account.
    pub paid: bool,
    /// Plan name, `"free"` by default.
    pub account_type: String,

    /// Slack user id.
    pub slack_id: Option<String>,
    /// Slack team id.
    pub slack_team_id: Option<String>,
    /// Slack OAuth access token.
    pub slack_access_token: Option<String>,

    /// Bearer token for API use.
    pub api_token: String,
}

impl User {
    /// Builds a fresh free account with generated uid, name and tokens.
    #[must_use]
    pub fn new(email: &str, phone: &str) -> Self {
        let now = Utc::now();
        Self {
            uid: random_string(ID_LEN),
            name: random_name(3),
            created: now,
            updated: now,
            expires: now + Duration::days(ACCOUNT_TTL_DAYS),
            admin: false,
            email: email.to_string(),
            phone: phone.to_string(),
            phone_code: Some(generate_token()),
            failed_2fa_attempts: 0,
            mail_token: Some(generate_token()),
            mail_confirm: false,
            mail_tries: 0,
            authenticated: false,
            active: true,
            anonymous: false,
            paid: false,
            account_type: "free".to_string(),
            slack_id: None,
            slack_team_id: None,
            slack_access_token: None,
            api_token: generate_token(),
        }
    }

    /// Whether the account is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the account has admin rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.admin
    }

    /// Whether the session is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the account is anonymous.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Whether a real phone number is on file.
    #[must_use]
    pub fn has_phone(&self) -> bool {
        self.phone != NO_PHONE
    }
}

/// Ways to look a user up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserLookup<'a> {
    /// By `uid`.
    Uid(&'a str),
    /// By assigned name.
    Name(&'a str),
    /// By email.
    Email(&'a str),
    /// By phone.
    Phone(&'a str),
    /// By email plus phone (the account's natural key).
    EmailPhone {
        /// Email address.
        email: &'a str,
        /// Phone number.
        phone: &'a str,
    },
    /// By pending mail confirmation token.
    MailToken(&'a str),
    /// By API bearer token.
    ApiToken(&'a str),
    /// By Slack user and team.
    Slack {
        /// Slack user id.
        slack_id: &'a str,
        /// Slack team id.
        team_id: &'a str,
    },
}

impl UserLookup<'_> {
    /// Returns `true` when `user` matches this lookup.
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        match *self {
            Self::Uid(uid) => user.uid == uid,
            Self::Name(name) => user.name == name,
            Self::Email(email) => user.email == email,
            Self::Phone(phone) => user.phone == phone,
            Self::EmailPhone { email, phone } => user.email == email && user.phone == phone,
            Self::MailToken(token) => user.mail_token.as_deref() == Some(token),
            Self::ApiToken(token) => user.api_token == token,
            Self::Slack { slack_id, team_id } => {
                user.slack_id.as_deref() == Some(slack_id)
                    && user.slack_team_id.as_deref() == Some(team_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_defaults() {
        let user = User::new(DEFAULT_EMAIL, NO_PHONE);
        assert_eq!(user.uid.len(), ID_LEN);
        assert_eq!(user.account_type, "free");
        assert!(user.is_active());
        assert!(!user.is_admin());
        assert!(!user.is_authenticated());
        assert!(!user.is_anonymous());
        assert_eq!(user.expires - user.created, Duration::days(ACCOUNT_TTL_DAYS));
        assert_ne!(user.api_token, user.mail_token.clone().unwrap_or_default());
    }

    #[test]
    fn has_phone_ignores_placeholder() {
        let mut user = User::new(DEFAULT_EMAIL, NO_PHONE);
        assert!(!user.has_phone());
        user.phone = "+15035551234".to_string();
        assert!(user.has_phone());
    }

    #[test]
    fn slack_lookup_needs_both_ids() {
        let mut user = User::new("a@example.com", NO_PHONE);
        user.slack_id = Some("U1".to_string());
        user.slack_team_id = Some("T1".to_string());
        assert!(
            UserLookup::Slack {
                slack_id: "U1",
                team_id: "T1"
            }
            .matches(&user)
        );
        assert!(
            !UserLookup::Slack {
                slack_id: "U1",
                team_id: "T2"
            }
            .matches(&user)
        );
    }
}
