//! Event queue DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Pipeline name.
    pub pipe: String,
    /// Entity tag.
    #[serde(default)]
    pub entity: Option<String>,
    /// Payload text.
    #[serde(default)]
    pub text: Option<String>,
}

/// Request body for `POST /events/pop`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PopEventRequest {
    /// Pipeline name.
    pub pipe: String,
    /// Narrow the pop to this entity.
    #[serde(default)]
    pub entity: Option<String>,
}
