//! Signup gating: waitlist entries and release versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A waitlisted email address. `email` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct WaitlistEntry {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Allowed to sign up.
    pub allow: bool,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Builds a not-yet-allowed entry stamped now.
    #[must_use]
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            allow: false,
            created: Utc::now(),
        }
    }
}

/// A release name gating signups. `name` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Version {
    /// Release name.
    pub name: String,
    /// Signups allowed for this release.
    pub allow: bool,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Version {
    /// Builds a not-yet-allowed version stamped now.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            allow: false,
            created: Utc::now(),
        }
    }
}
