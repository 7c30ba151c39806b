//! Sidekick handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::CreateSidekickRequest;
use crate::app_state::AppState;
use crate::domain::Sidekick;
use crate::error::{ErrorResponse, ServiceError};

/// `GET /sidekicks`: The caller's sidekicks.
///
/// # Errors
///
/// Returns a [`ServiceError`] if the datastore fails.
#[utoipa::path(
    get,
    path = "/api/v1/sidekicks",
    tag = "Sidekicks",
    summary = "List sidekicks",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Up to 20 sidekicks, oldest first", body = Vec<Sidekick>),
    )
)]
pub async fn list_sidekicks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.sidekicks.get_by_user_all(&user.uid).await?))
}

/// `POST /sidekicks`: Provision a search core and record it.
///
/// # Errors
///
/// Returns [`ServiceError::Provisioning`] if the index instance refuses
/// the core; nothing is stored in that case.
#[utoipa::path(
    post,
    path = "/api/v1/sidekicks",
    tag = "Sidekicks",
    summary = "Create a sidekick",
    security(("bearer" = [])),
    request_body = CreateSidekickRequest,
    responses(
        (status = 201, description = "Sidekick", body = Sidekick),
        (status = 502, description = "Index provisioning failed", body = ErrorResponse),
    )
)]
pub async fn create_sidekick(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateSidekickRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sidekick = state.sidekicks.create(&user.uid, &req.title).await?;
    Ok((StatusCode::CREATED, Json(sidekick)))
}

/// `GET /sidekicks/default`: The sidekick named by the `sidekick` setting.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] when no default is set or it no
/// longer exists.
#[utoipa::path(
    get,
    path = "/api/v1/sidekicks/default",
    tag = "Sidekicks",
    summary = "Default sidekick",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Sidekick", body = Sidekick),
        (status = 404, description = "No default sidekick", body = ErrorResponse),
    )
)]
pub async fn get_default_sidekick(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let sidekick = state
        .sidekicks
        .get_by_user(&user.uid)
        .await?
        .ok_or_else(|| ServiceError::not_found("sidekick", "default"))?;
    Ok(Json(sidekick))
}

/// `GET /sidekicks/{nick}`: One of the caller's sidekicks.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if the caller has no such sidekick.
#[utoipa::path(
    get,
    path = "/api/v1/sidekicks/{nick}",
    tag = "Sidekicks",
    summary = "Get a sidekick",
    security(("bearer" = [])),
    params(
        ("nick" = String, Path, description = "Sidekick nick"),
    ),
    responses(
        (status = 200, description = "Sidekick", body = Sidekick),
        (status = 404, description = "Sidekick not found", body = ErrorResponse),
    )
)]
pub async fn get_sidekick(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(nick): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let sidekick = state
        .sidekicks
        .get_by_uid_nick(&user.uid, &nick)
        .await?
        .ok_or_else(|| ServiceError::not_found("sidekick", &nick))?;
    Ok(Json(sidekick))
}

/// Sidekick routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sidekicks", get(list_sidekicks).post(create_sidekick))
        .route("/sidekicks/default", get(get_default_sidekick))
        .route("/sidekicks/{nick}", get(get_sidekick))
}
