//! Account DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::User;

/// Request body for `POST /users`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Email address. Defaults to the no-reply address.
    #[serde(default)]
    pub email: String,
    /// Phone number. Defaults to `"+1"` (no phone).
    #[serde(default)]
    pub phone: String,
}

/// Public view of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// External-facing identifier.
    pub uid: String,
    /// Assigned name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Whether a real phone number is on file.
    pub has_phone: bool,
    /// Plan name.
    pub account_type: String,
    /// Admin rights.
    pub admin: bool,
    /// Paying account.
    pub paid: bool,
    /// Account active.
    pub active: bool,
    /// Email confirmed.
    pub mail_confirm: bool,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Account expiry.
    pub expires: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            has_phone: user.has_phone(),
            account_type: user.account_type.clone(),
            admin: user.is_admin(),
            paid: user.paid,
            active: user.is_active(),
            mail_confirm: user.mail_confirm,
            created: user.created,
            expires: user.expires,
        }
    }
}

/// Response body for `POST /users`: the new account and its bearer token.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateUserResponse {
    /// The account.
    pub user: UserResponse,
    /// Bearer token for subsequent requests.
    pub api_token: String,
}

/// Response body for `POST /users/me/token`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Freshly rotated bearer token.
    pub api_token: String,
}
