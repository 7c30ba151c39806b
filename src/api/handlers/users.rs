//! Account handlers: sign up, current user, token rotation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::{CreateUserRequest, CreateUserResponse, TokenResponse, UserResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ServiceError};

/// `POST /users`: Create an account.
///
/// # Errors
///
/// Returns [`ServiceError::Conflict`] when the email and phone already
/// belong to an account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    summary = "Create an account",
    description = "Creates an account for the email and phone pair and returns its bearer token. Existing pairs are rejected so tokens are only ever handed out once.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = CreateUserResponse),
        (status = 409, description = "Account already exists", body = ErrorResponse),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let stored = state.users.register(&req.email, &req.phone).await?;
    if !stored.created {
        return Err(ServiceError::Conflict("account already exists".to_string()));
    }
    let user = stored.record;
    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            user: UserResponse::from(&user),
            api_token: user.api_token,
        }),
    ))
}

/// `GET /users/me`: The authenticated account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    summary = "Current account",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
    )
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(UserResponse::from(&user))
}

/// `POST /users/me/token`: Rotate the bearer token.
///
/// # Errors
///
/// Returns a [`ServiceError`] if the account vanished or the datastore fails.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/token",
    tag = "Users",
    summary = "Rotate API token",
    description = "Issues a new bearer token. The old token stops working immediately.",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New token", body = TokenResponse),
        (status = 401, description = "Missing or unknown token", body = ErrorResponse),
    )
)]
pub async fn reset_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.users.token_reset(&user.uid).await?;
    Ok(Json(TokenResponse {
        api_token: user.api_token,
    }))
}

/// `GET /users/{uid}`: Look up an account.
///
/// Callers see their own account; admins see any.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] for unknown or inaccessible accounts.
#[utoipa::path(
    get,
    path = "/api/v1/users/{uid}",
    tag = "Users",
    summary = "Get account",
    security(("bearer" = [])),
    params(
        ("uid" = String, Path, description = "Account uid"),
    ),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    if caller.uid != uid && !caller.is_admin() {
        return Err(ServiceError::not_found("user", uid));
    }
    let user = state
        .users
        .get_by_uid(&uid)
        .await?
        .ok_or_else(|| ServiceError::not_found("user", &uid))?;
    Ok(Json(UserResponse::from(&user)))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/me", get(get_me))
        .route("/users/me/token", post(reset_token))
        .route("/users/{uid}", get(get_user))
}
