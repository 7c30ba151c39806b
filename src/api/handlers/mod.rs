//! REST endpoint handlers organized by resource.

pub mod events;
pub mod ledger;
pub mod settings;
pub mod sidekicks;
pub mod spools;
pub mod system;
pub mod users;
pub mod waitlist;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(settings::routes())
        .merge(spools::routes())
        .merge(sidekicks::routes())
        .merge(events::routes())
        .merge(ledger::routes())
        .merge(waitlist::routes())
}
