//! Waitlist handlers. Both routes are unauthenticated.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::JoinWaitlistRequest;
use crate::app_state::AppState;
use crate::domain::WaitlistEntry;
use crate::error::{ErrorResponse, ServiceError};

/// `POST /waitlist`: Join the waitlist.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for an empty email.
#[utoipa::path(
    post,
    path = "/api/v1/waitlist",
    tag = "Waitlist",
    summary = "Join the waitlist",
    request_body = JoinWaitlistRequest,
    responses(
        (status = 201, description = "Waitlist entry", body = WaitlistEntry),
        (status = 400, description = "Invalid email", body = ErrorResponse),
    )
)]
pub async fn join_waitlist(
    State(state): State<AppState>,
    Json(req): Json<JoinWaitlistRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let entry = state.signup.create_waitlist(&req.email, &req.name).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `GET /waitlist/{email}`: Waitlist status for an email.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if the email is not on the list.
#[utoipa::path(
    get,
    path = "/api/v1/waitlist/{email}",
    tag = "Waitlist",
    summary = "Waitlist status",
    params(
        ("email" = String, Path, description = "Email address"),
    ),
    responses(
        (status = 200, description = "Waitlist entry", body = WaitlistEntry),
        (status = 404, description = "Not on the waitlist", body = ErrorResponse),
    )
)]
pub async fn get_waitlist_entry(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let entry = state
        .signup
        .get_waitlist_by_email(&email)
        .await?
        .ok_or_else(|| ServiceError::not_found("waitlist entry", &email))?;
    Ok(Json(entry))
}

/// Waitlist routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/waitlist", post(join_waitlist))
        .route("/waitlist/{email}", get(get_waitlist_entry))
}
