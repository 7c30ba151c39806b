//! Settings, spool and sidekick DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Spool, SpoolFile};

/// Request body for `POST /settings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSettingRequest {
    /// Setting name.
    pub name: String,
    /// Initial value, kept if the setting already exists.
    pub value: serde_json::Value,
}

/// Request body for `PUT /settings/{name}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PutSettingRequest {
    /// New value.
    pub value: serde_json::Value,
}

/// Request body for `POST /spools`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSpoolRequest {
    /// Title, cut to 1000 characters.
    #[serde(default)]
    pub title: Option<String>,
    /// Hostname to merge on.
    #[serde(default)]
    pub fq_domain: Option<String>,
    /// Visibility. Defaults to public.
    #[serde(default)]
    pub public: Option<bool>,
}

/// Response body for `GET /spools/{name}/files`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpoolFilesResponse {
    /// The spool.
    pub spool: Spool,
    /// Number of files.
    pub count: usize,
    /// Files, oldest update first.
    pub files: Vec<SpoolFile>,
}

/// Request body for `POST /sidekicks`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSidekickRequest {
    /// Title.
    #[serde(default)]
    pub title: String,
}
