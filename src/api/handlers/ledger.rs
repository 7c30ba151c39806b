//! Transaction and Slack webhook handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::{CreateTransactionRequest, SlackEventRequest, SlackEventResponse};
use crate::app_state::AppState;
use crate::domain::Transaction;
use crate::error::{ErrorResponse, ServiceError};

/// `POST /transactions`: Record a transaction for the caller.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for an empty `tid`, or
/// [`ServiceError::NotFound`] when `tid` belongs to another user.
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "Transactions",
    summary = "Record a transaction",
    description = "Records the transaction id. Repeating one of the caller's ids returns the stored record; an id recorded by another user answers 404.",
    security(("bearer" = [])),
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction", body = Transaction),
        (status = 400, description = "Invalid tid", body = ErrorResponse),
        (status = 404, description = "Transaction owned by another user", body = ErrorResponse),
    )
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tx = state
        .ledger
        .create_transaction(&req.tid, Some(&user.uid))
        .await?;
    if tx.uid.as_deref() != Some(user.uid.as_str()) {
        return Err(ServiceError::not_found("transaction", &req.tid));
    }
    Ok((StatusCode::CREATED, Json(tx)))
}

/// `GET /transactions/{tid}`: One of the caller's transactions.
///
/// # Errors
///
/// Returns [`ServiceError::NotFound`] if the caller has no such transaction.
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{tid}",
    tag = "Transactions",
    summary = "Get a transaction",
    security(("bearer" = [])),
    params(
        ("tid" = String, Path, description = "Transaction id"),
    ),
    responses(
        (status = 200, description = "Transaction", body = Transaction),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
    )
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tid): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let tx = state
        .ledger
        .get_transaction(&tid)
        .await?
        .filter(|tx| tx.uid.as_deref() == Some(user.uid.as_str()))
        .ok_or_else(|| ServiceError::not_found("transaction", &tid))?;
    Ok(Json(tx))
}

/// `POST /slack/events`: Dedup an inbound Slack event.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] for an empty `event_id`.
#[utoipa::path(
    post,
    path = "/api/v1/slack/events",
    tag = "Slack",
    summary = "Record a Slack event",
    description = "Records the event id and reports whether it had been seen before, so webhook retries are acknowledged without reprocessing.",
    request_body = SlackEventRequest,
    responses(
        (status = 200, description = "Dedup result", body = SlackEventResponse),
        (status = 400, description = "Invalid event id", body = ErrorResponse),
    )
)]
pub async fn record_slack_event(
    State(state): State<AppState>,
    Json(req): Json<SlackEventRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let stored = state
        .ledger
        .create_slack_event(req.event_time, &req.event_id)
        .await?;
    Ok(Json(SlackEventResponse {
        event_id: stored.record.event_id,
        duplicate: !stored.created,
    }))
}

/// Transaction and Slack routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(create_transaction))
        .route("/transactions/{tid}", get(get_transaction))
        .route("/slack/events", post(record_slack_event))
}
