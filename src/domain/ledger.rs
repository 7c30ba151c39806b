//! Transaction markers and inbound Slack event dedup records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque transaction marker. `tid` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Transaction {
    /// Transaction id.
    pub tid: String,
    /// Owning user.
    pub uid: Option<String>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Transaction {
    /// Builds a marker stamped now.
    #[must_use]
    pub fn new(tid: &str, uid: Option<&str>) -> Self {
        Self {
            tid: tid.to_string(),
            uid: uid.map(str::to_string),
            created: Utc::now(),
        }
    }
}

/// Seen-marker for a Slack webhook delivery. `event_id` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SlackEvent {
    /// Slack's event id.
    pub event_id: String,
    /// Slack's event time (unix seconds).
    pub event_time: i64,
    /// When we first saw it.
    pub created: DateTime<Utc>,
}

impl SlackEvent {
    /// Builds a marker stamped now.
    #[must_use]
    pub fn new(event_id: &str, event_time: i64) -> Self {
        Self {
            event_id: event_id.to_string(),
            event_time,
            created: Utc::now(),
        }
    }
}
