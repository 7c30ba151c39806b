//! Per-user settings handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::{CreateSettingRequest, PutSettingRequest};
use crate::app_state::AppState;
use crate::domain::Setting;
use crate::error::{ErrorResponse, ServiceError};

/// `GET /settings`: The caller's settings.
///
/// # Errors
///
/// Returns a [`ServiceError`] if the datastore fails.
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    tag = "Settings",
    summary = "List settings",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Settings by name", body = Vec<Setting>),
    )
)]
pub async fn list_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.settings.get_all(&user.uid).await?))
}

/// `POST /settings`: Create a setting unless it exists.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for an empty name.
#[utoipa::path(
    post,
    path = "/api/v1/settings",
    tag = "Settings",
    summary = "Create a setting",
    description = "Creates the setting with the given value. An existing setting is returned unchanged.",
    security(("bearer" = [])),
    request_body = CreateSettingRequest,
    responses(
        (status = 201, description = "Stored setting", body = Setting),
        (status = 400, description = "Invalid name", body = ErrorResponse),
    )
)]
pub async fn create_setting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateSettingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let setting = state
        .settings
        .create(&user.uid, &req.name, req.value)
        .await?;
    Ok((StatusCode::CREATED, Json(setting)))
}

/// `GET /settings/{name}`: One setting.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if the setting does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/settings/{name}",
    tag = "Settings",
    summary = "Get a setting",
    security(("bearer" = [])),
    params(
        ("name" = String, Path, description = "Setting name"),
    ),
    responses(
        (status = 200, description = "Setting", body = Setting),
        (status = 404, description = "Setting not found", body = ErrorResponse),
    )
)]
pub async fn get_setting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let setting = state
        .settings
        .get_by_uid_name(&user.uid, &name)
        .await?
        .ok_or_else(|| ServiceError::not_found("setting", &name))?;
    Ok(Json(setting))
}

/// `PUT /settings/{name}`: Write a setting.
///
/// # Errors
///
/// Returns a [`ServiceError`] if the datastore fails.
#[utoipa::path(
    put,
    path = "/api/v1/settings/{name}",
    tag = "Settings",
    summary = "Write a setting",
    security(("bearer" = [])),
    params(
        ("name" = String, Path, description = "Setting name"),
    ),
    request_body = PutSettingRequest,
    responses(
        (status = 200, description = "Stored setting", body = Setting),
    )
)]
pub async fn put_setting(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    Json(req): Json<PutSettingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.settings.put(&user.uid, &name, req.value).await?))
}

/// Settings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(list_settings).post(create_setting))
        .route("/settings/{name}", get(get_setting).put(put_setting))
}
