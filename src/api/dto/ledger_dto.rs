//! Transaction, Slack and waitlist DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /transactions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Transaction identifier supplied by the caller.
    pub tid: String,
}

/// Request body for `POST /slack/events`.
///
/// Only the envelope fields used for dedup are read; the rest of the
/// webhook payload is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SlackEventRequest {
    /// Slack event id.
    pub event_id: String,
    /// Slack event time (epoch seconds).
    #[serde(default)]
    pub event_time: i64,
}

/// Response body for `POST /slack/events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlackEventResponse {
    /// Slack event id.
    pub event_id: String,
    /// `true` when the event had already been recorded.
    pub duplicate: bool,
}

/// Request body for `POST /waitlist`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinWaitlistRequest {
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}
