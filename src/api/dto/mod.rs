//! Data Transfer Objects for REST request/response serialization.
//!
//! Stored records that carry no secrets (settings, spools, sidekicks,
//! transactions, waitlist entries) are returned as-is; user accounts go
//! through [`UserResponse`] so tokens never leak.

pub mod event_dto;
pub mod ledger_dto;
pub mod resource_dto;
pub mod user_dto;

pub use event_dto::*;
pub use ledger_dto::*;
pub use resource_dto::*;
pub use user_dto::*;
