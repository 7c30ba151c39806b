//! OpenAPI document for the REST API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{
    CreateEventRequest, CreateSettingRequest, CreateSidekickRequest, CreateSpoolRequest,
    CreateTransactionRequest, CreateUserRequest, CreateUserResponse, JoinWaitlistRequest,
    PopEventRequest, PutSettingRequest, SlackEventRequest, SlackEventResponse,
    SpoolFilesResponse, TokenResponse, UserResponse,
};
use crate::api::handlers::{events, ledger, settings, sidekicks, spools, system, users, waitlist};
use crate::domain::{
    EventReceipt, PoppedEvent, Setting, Sidekick, Spool, SpoolFile, Transaction, WaitlistEntry,
};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of every `/api/v1` route plus `/health`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "mitta-api",
        description = "Users, settings, spools, sidekicks and the expiring event queue"
    ),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Users", description = "Accounts and API tokens"),
        (name = "Settings", description = "Per-user key/value settings"),
        (name = "Spools", description = "Object-storage namespaces"),
        (name = "Sidekicks", description = "Search-index cores"),
        (name = "Events", description = "Expiring single-slot queue"),
        (name = "Transactions", description = "Transaction markers"),
        (name = "Slack", description = "Inbound webhook dedup"),
        (name = "Waitlist", description = "Signup gating")
    ),
    paths(
        system::health_handler,
        users::create_user,
        users::get_me,
        users::reset_token,
        users::get_user,
        settings::list_settings,
        settings::create_setting,
        settings::get_setting,
        settings::put_setting,
        spools::list_spools,
        spools::create_spool,
        spools::get_spool,
        spools::list_spool_files,
        spools::get_public_spool,
        sidekicks::list_sidekicks,
        sidekicks::create_sidekick,
        sidekicks::get_default_sidekick,
        sidekicks::get_sidekick,
        events::create_event,
        events::pop_event,
        ledger::create_transaction,
        ledger::get_transaction,
        ledger::record_slack_event,
        waitlist::join_waitlist,
        waitlist::get_waitlist_entry,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
        CreateUserRequest,
        CreateUserResponse,
        UserResponse,
        TokenResponse,
        Setting,
        CreateSettingRequest,
        PutSettingRequest,
        Spool,
        SpoolFile,
        CreateSpoolRequest,
        SpoolFilesResponse,
        Sidekick,
        CreateSidekickRequest,
        EventReceipt,
        PoppedEvent,
        CreateEventRequest,
        PopEventRequest,
        Transaction,
        CreateTransactionRequest,
        SlackEventRequest,
        SlackEventResponse,
        WaitlistEntry,
        JoinWaitlistRequest,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by authenticated paths.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}
