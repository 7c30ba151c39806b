//! Event queue handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::{CreateEventRequest, PopEventRequest};
use crate::app_state::AppState;
use crate::domain::{EventReceipt, PoppedEvent};
use crate::error::{ErrorResponse, ServiceError};

/// `POST /events`: Queue an entry for the caller.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for an empty pipe.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Queue an event",
    description = "Stores a short-lived entry for the caller's pipe. Entries expire after the queue TTL (60 s by default). The returned `created` is always `\"1\"`.",
    security(("bearer" = [])),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Queued entry", body = EventReceipt),
        (status = 400, description = "Invalid pipe", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt = state
        .events
        .create(
            &user.uid,
            &req.pipe,
            req.entity.as_deref(),
            req.text.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `POST /events/pop`: Take the caller's oldest live entry for a pipe.
///
/// # Errors
///
/// Returns a [`ServiceError`] if the datastore fails.
#[utoipa::path(
    post,
    path = "/api/v1/events/pop",
    tag = "Events",
    summary = "Pop an event",
    description = "Removes and returns the oldest live entry for the pipe, optionally narrowed to an entity. Responds 204 when nothing is queued.",
    security(("bearer" = [])),
    request_body = PopEventRequest,
    responses(
        (status = 200, description = "Popped entry", body = PoppedEvent),
        (status = 204, description = "Queue empty"),
    )
)]
pub async fn pop_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<PopEventRequest>,
) -> Result<Response, ServiceError> {
    let popped = match req.entity.as_deref() {
        Some(entity) => {
            state
                .events
                .pop_by_uid_pipe_entity(&user.uid, &req.pipe, entity)
                .await?
        }
        None => state.events.pop_by_uid_pipe(&user.uid, &req.pipe).await?,
    };
    Ok(match popped {
        Some(event) => Json(event).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Event queue routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/pop", post(pop_event))
}
