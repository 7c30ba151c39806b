//! Spool handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::{CreateSpoolRequest, SpoolFilesResponse};
use crate::app_state::AppState;
use crate::domain::Spool;
use crate::error::{ErrorResponse, ServiceError};

/// `GET /spools`: The caller's private spools.
///
/// # Errors
///
/// Returns a [`ServiceError`] if the datastore fails.
#[utoipa::path(
    get,
    path = "/api/v1/spools",
    tag = "Spools",
    summary = "List private spools",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Private spools, oldest first", body = Vec<Spool>),
    )
)]
pub async fn list_spools(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.spools.get_all(&user.uid).await?))
}

/// `POST /spools`: Create a spool or merge into the hostname's spool.
///
/// # Errors
///
/// Returns a [`ServiceError`] if the datastore fails.
#[utoipa::path(
    post,
    path = "/api/v1/spools",
    tag = "Spools",
    summary = "Create a spool",
    description = "Creates a spool. When `fq_domain` already has a public spool, or one owned by the caller, that spool is returned instead.",
    security(("bearer" = [])),
    request_body = CreateSpoolRequest,
    responses(
        (status = 201, description = "Spool", body = Spool),
    )
)]
pub async fn create_spool(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateSpoolRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let spool = state
        .spools
        .create(
            &user.uid,
            req.title.as_deref(),
            req.fq_domain.as_deref(),
            req.public,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(spool)))
}

/// `GET /spools/{name}`: One of the caller's spools.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if the caller has no such spool.
#[utoipa::path(
    get,
    path = "/api/v1/spools/{name}",
    tag = "Spools",
    summary = "Get a spool",
    security(("bearer" = [])),
    params(
        ("name" = String, Path, description = "Spool name"),
    ),
    responses(
        (status = 200, description = "Spool", body = Spool),
        (status = 404, description = "Spool not found", body = ErrorResponse),
    )
)]
pub async fn get_spool(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let spool = state
        .spools
        .get_by_uid_name(&user.uid, &name)
        .await?
        .ok_or_else(|| ServiceError::not_found("spool", &name))?;
    Ok(Json(spool))
}

/// `GET /spools/{name}/files`: Files stored in one of the caller's spools.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if the caller has no such spool, or
/// [`ServiceError::Storage`] if the bucket listing fails.
#[utoipa::path(
    get,
    path = "/api/v1/spools/{name}/files",
    tag = "Spools",
    summary = "List spool files",
    security(("bearer" = [])),
    params(
        ("name" = String, Path, description = "Spool name"),
    ),
    responses(
        (status = 200, description = "Files, oldest update first", body = SpoolFilesResponse),
        (status = 404, description = "Spool not found", body = ErrorResponse),
        (status = 502, description = "Object storage failure", body = ErrorResponse),
    )
)]
pub async fn list_spool_files(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let spool = state
        .spools
        .get_by_uid_name(&user.uid, &name)
        .await?
        .ok_or_else(|| ServiceError::not_found("spool", &name))?;
    let files = state.spools.list_files(&spool).await?;
    Ok(Json(SpoolFilesResponse {
        spool,
        count: files.len(),
        files,
    }))
}

/// `GET /public/spools/{nick}`: A public spool, no authentication.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if no public spool has this nick.
#[utoipa::path(
    get,
    path = "/api/v1/public/spools/{nick}",
    tag = "Spools",
    summary = "Get a public spool",
    params(
        ("nick" = String, Path, description = "Spool nick"),
    ),
    responses(
        (status = 200, description = "Spool", body = Spool),
        (status = 404, description = "Spool not found", body = ErrorResponse),
    )
)]
pub async fn get_public_spool(
    State(state): State<AppState>,
    Path(nick): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let spool = state
        .spools
        .get_by_nick(&nick)
        .await?
        .ok_or_else(|| ServiceError::not_found("spool", &nick))?;
    Ok(Json(spool))
}

/// Spool routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/spools", get(list_spools).post(create_spool))
        .route("/spools/{name}", get(get_spool))
        .route("/spools/{name}/files", get(list_spool_files))
        .route("/public/spools/{nick}", get(get_public_spool))
}
