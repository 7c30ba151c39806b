//! Bearer-token authentication.
//!
//! Handlers that take a [`CurrentUser`] require
//! `Authorization: Bearer <api_token>` naming an active account.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::User;
use crate::error::ServiceError;

/// The account behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(ServiceError::Unauthorized);
        };
        match state.users.get_by_token(token).await? {
            Some(user) if user.is_active() => Ok(Self(user)),
            Some(user) => {
                tracing::debug!(uid = %user.uid, "inactive account rejected");
                Err(ServiceError::Unauthorized)
            }
            None => Err(ServiceError::Unauthorized),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
