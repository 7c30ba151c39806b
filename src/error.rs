//! Service error types with HTTP status code mapping.
//!
//! [`ServiceError`] is the central error type. Lookups that find nothing
//! return `Ok(None)` from the datastore and service layers; only the HTTP
//! layer turns absence into [`ServiceError::NotFound`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "spool not found: spool_x1Y2z3",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Service-wide error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                    |
/// |-----------|----------------------|--------------------------------|
/// | 1000–1999 | Validation / auth    | 400 Bad Request / 401          |
/// | 2000–2999 | Not Found / Conflict | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Backend / external   | 500 / 502 / 503                |
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing or unknown bearer token.
    #[error("unauthorized")]
    Unauthorized,

    /// No record matched the lookup.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind (e.g. `"spool"`).
        entity: &'static str,
        /// Natural key that was looked up.
        key: String,
    },

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The datastore is unreachable or a query failed.
    #[error("datastore error: {0}")]
    Backend(String),

    /// Object storage request failed.
    #[error("object storage error: {0}")]
    Storage(String),

    /// Search index provisioning failed.
    #[error("index provisioning error: {0}")]
    Provisioning(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Shorthand for a [`ServiceError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::Unauthorized => 1002,
            Self::NotFound { .. } => 2001,
            Self::Conflict(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Backend(_) => 3001,
            Self::Storage(_) => 3002,
            Self::Provisioning(_) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) | Self::Provisioning(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
