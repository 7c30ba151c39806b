//! Short-lived queue entries keyed by user and pipeline.
//!
//! A producer deposits a [`QueuedEvent`] for `(uid, pipe[, entity])` and a
//! consumer pops the oldest matching entry. Entries older than the queue
//! TTL are never handed out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::naming::{ID_LEN, random_string};

/// Value returned in place of the creation time on a fresh entry.
pub const REDACTED_CREATED: &str = "1";

/// A stored queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueuedEvent {
    /// Event identifier.
    pub eid: String,
    /// Target user.
    pub uid: String,
    /// Pipeline name.
    pub pipe: String,
    /// Optional entity tag narrowing the pipeline.
    pub entity: Option<String>,
    /// Payload text.
    pub text: Option<String>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl QueuedEvent {
    /// Builds an entry with a fresh `eid`, stamped now.
    #[must_use]
    pub fn new(uid: &str, pipe: &str, entity: Option<&str>, text: Option<&str>) -> Self {
        Self {
            eid: random_string(ID_LEN),
            uid: uid.to_string(),
            pipe: pipe.to_string(),
            entity: entity.map(str::to_string),
            text: text.map(str::to_string),
            created: Utc::now(),
        }
    }

    /// Projection handed back to the producer, with `created` redacted.
    #[must_use]
    pub fn receipt(&self) -> EventReceipt {
        EventReceipt {
            eid: self.eid.clone(),
            uid: self.uid.clone(),
            pipe: self.pipe.clone(),
            entity: self.entity.clone(),
            text: self.text.clone(),
            created: REDACTED_CREATED.to_string(),
        }
    }

    /// Payload handed to the consumer on pop.
    #[must_use]
    pub fn into_popped(self) -> PoppedEvent {
        PoppedEvent {
            pipe: self.pipe,
            entity: self.entity,
            text: self.text,
        }
    }
}

/// Producer-facing view of a stored entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EventReceipt {
    /// Event identifier.
    pub eid: String,
    /// Target user.
    pub uid: String,
    /// Pipeline name.
    pub pipe: String,
    /// Entity tag.
    pub entity: Option<String>,
    /// Payload text.
    pub text: Option<String>,
    /// Always [`REDACTED_CREATED`].
    pub created: String,
}

/// Consumer-facing payload of a popped entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PoppedEvent {
    /// Pipeline name.
    pub pipe: String,
    /// Entity tag.
    pub entity: Option<String>,
    /// Payload text.
    pub text: Option<String>,
}

/// Selects entries for a pop. `entity: None` matches any entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKey<'a> {
    /// Target user.
    pub uid: &'a str,
    /// Pipeline name.
    pub pipe: &'a str,
    /// Entity tag, if the pop is narrowed to one.
    pub entity: Option<&'a str>,
}

impl EventKey<'_> {
    /// Returns `true` when `event` belongs to this key.
    #[must_use]
    pub fn matches(&self, event: &QueuedEvent) -> bool {
        event.uid == self.uid
            && event.pipe == self.pipe
            && self
                .entity
                .is_none_or(|entity| event.entity.as_deref() == Some(entity))
    }
}
