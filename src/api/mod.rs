//! REST API layer: route handlers, DTOs, bearer auth and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` sits at the
//! root. With the `swagger-ui` feature the OpenAPI document is served at
//! `/api-docs/openapi.json` and browsable under `/swagger-ui`.

pub mod auth;
pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServiceConfig;
    use crate::index::NoopProvisioner;
    use crate::persistence::MemoryDatastore;
    use crate::storage::MemoryBlobStore;

    struct TestApp {
        router: Router,
        blobs: Arc<MemoryBlobStore>,
    }

    fn test_app() -> TestApp {
        let blobs = Arc::new(MemoryBlobStore::new());
        let state = AppState::new(
            Arc::new(MemoryDatastore::new()),
            Arc::clone(&blobs) as _,
            Arc::new(NoopProvisioner),
            &ServiceConfig::default(),
        );
        TestApp {
            router: build_router().with_state(state),
            blobs,
        }
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let Ok(request) = builder.body(body) else {
            panic!("request should build");
        };
        let Ok(response) = router.clone().oneshot(request).await else {
            panic!("router is infallible");
        };
        response
    }

    async fn json_body(response: Response) -> Value {
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body should be readable");
        };
        let Ok(value) = serde_json::from_slice(&bytes) else {
            panic!("body should be JSON");
        };
        value
    }

    async fn sign_up(router: &Router, email: &str) -> String {
        let response = send(router, "POST", "/api/v1/users", None, Some(json!({ "email": email }))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let Some(token) = body["api_token"].as_str() else {
            panic!("token missing from {body}");
        };
        token.to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app();
        let response = send(&app.router, "GET", "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let app = test_app();
        let response = send(&app.router, "GET", "/api/v1/users/me", Some("nope"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], 1002);

        let missing = send(&app.router, "GET", "/api/v1/spools", None, None).await;
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_up_then_me_hides_tokens() {
        let app = test_app();
        let token = sign_up(&app.router, "me@example.com").await;

        let response = send(&app.router, "GET", "/api/v1/users/me", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["email"], "me@example.com");
        assert!(body.get("api_token").is_none());

        let again = send(
            &app.router,
            "POST",
            "/api/v1/users",
            None,
            Some(json!({ "email": "me@example.com" })),
        )
        .await;
        assert_eq!(again.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn token_rotation_invalidates_old_token() {
        let app = test_app();
        let token = sign_up(&app.router, "rot@example.com").await;

        let response = send(&app.router, "POST", "/api/v1/users/me/token", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let Some(fresh) = body["api_token"].as_str() else {
            panic!("new token missing");
        };

        let old = send(&app.router, "GET", "/api/v1/users/me", Some(&token), None).await;
        assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
        let new = send(&app.router, "GET", "/api/v1/users/me", Some(fresh), None).await;
        assert_eq!(new.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn event_queue_round_trip() {
        let app = test_app();
        let token = sign_up(&app.router, "q@example.com").await;

        let created = send(
            &app.router,
            "POST",
            "/api/v1/events",
            Some(&token),
            Some(json!({ "pipe": "crawl", "text": "hello" })),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(json_body(created).await["created"], "1");

        let popped = send(
            &app.router,
            "POST",
            "/api/v1/events/pop",
            Some(&token),
            Some(json!({ "pipe": "crawl" })),
        )
        .await;
        assert_eq!(popped.status(), StatusCode::OK);
        assert_eq!(json_body(popped).await["text"], "hello");

        let empty = send(
            &app.router,
            "POST",
            "/api/v1/events/pop",
            Some(&token),
            Some(json!({ "pipe": "crawl" })),
        )
        .await;
        assert_eq!(empty.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn spool_files_listing() {
        let app = test_app();
        let token = sign_up(&app.router, "s@example.com").await;

        let created = send(
            &app.router,
            "POST",
            "/api/v1/spools",
            Some(&token),
            Some(json!({ "title": "photos", "public": false })),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let spool = json_body(created).await;
        let (Some(uid), Some(name)) = (spool["uid"].as_str(), spool["name"].as_str()) else {
            panic!("spool fields missing");
        };
        app.blobs
            .put(format!("{uid}/{name}/cat.png"), chrono::Utc::now())
            .await;

        let files = send(
            &app.router,
            "GET",
            &format!("/api/v1/spools/{name}/files"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(files.status(), StatusCode::OK);
        let body = json_body(files).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["files"][0]["filename"], "cat.png");

        let missing = send(
            &app.router,
            "GET",
            "/api/v1/spools/spool_missing/files",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn public_spool_visible_without_token() {
        let app = test_app();
        let token = sign_up(&app.router, "p@example.com").await;
        let created = send(&app.router, "POST", "/api/v1/spools", Some(&token), Some(json!({}))).await;
        let spool = json_body(created).await;
        let Some(nick) = spool["nick"].as_str() else {
            panic!("nick missing");
        };

        let response = send(&app.router, "GET", &format!("/api/v1/public/spools/{nick}"), None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn default_sidekick_follows_setting() {
        let app = test_app();
        let token = sign_up(&app.router, "k@example.com").await;

        let none = send(&app.router, "GET", "/api/v1/sidekicks/default", Some(&token), None).await;
        assert_eq!(none.status(), StatusCode::NOT_FOUND);

        let created = send(
            &app.router,
            "POST",
            "/api/v1/sidekicks",
            Some(&token),
            Some(json!({ "title": "notes" })),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let sidekick = json_body(created).await;
        let Some(nick) = sidekick["nick"].as_str() else {
            panic!("nick missing");
        };

        let put = send(
            &app.router,
            "PUT",
            "/api/v1/settings/sidekick",
            Some(&token),
            Some(json!({ "value": nick })),
        )
        .await;
        assert_eq!(put.status(), StatusCode::OK);

        let found = send(&app.router, "GET", "/api/v1/sidekicks/default", Some(&token), None).await;
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(json_body(found).await["nick"], nick);
    }

    #[tokio::test]
    async fn slack_events_report_duplicates() {
        let app = test_app();
        let body = json!({ "event_id": "Ev123", "event_time": 1_700_000_000 });

        let first = send(&app.router, "POST", "/api/v1/slack/events", None, Some(body.clone())).await;
        assert_eq!(json_body(first).await["duplicate"], false);
        let second = send(&app.router, "POST", "/api/v1/slack/events", None, Some(body)).await;
        assert_eq!(json_body(second).await["duplicate"], true);
    }

    #[tokio::test]
    async fn transactions_are_scoped_to_owner() {
        let app = test_app();
        let owner = sign_up(&app.router, "t1@example.com").await;
        let other = sign_up(&app.router, "t2@example.com").await;

        let created = send(
            &app.router,
            "POST",
            "/api/v1/transactions",
            Some(&owner),
            Some(json!({ "tid": "tx-9" })),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);

        let mine = send(&app.router, "GET", "/api/v1/transactions/tx-9", Some(&owner), None).await;
        assert_eq!(mine.status(), StatusCode::OK);
        let theirs = send(&app.router, "GET", "/api/v1/transactions/tx-9", Some(&other), None).await;
        assert_eq!(theirs.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn foreign_transaction_id_is_not_claimable() {
        let app = test_app();
        let owner = sign_up(&app.router, "t3@example.com").await;
        let other = sign_up(&app.router, "t4@example.com").await;
        let body = json!({ "tid": "tx-10" });

        let created = send(&app.router, "POST", "/api/v1/transactions", Some(&owner), Some(body.clone())).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let Some(owner_uid) = json_body(created).await["uid"].as_str().map(str::to_string) else {
            panic!("uid missing");
        };

        let claimed = send(&app.router, "POST", "/api/v1/transactions", Some(&other), Some(body.clone())).await;
        assert_eq!(claimed.status(), StatusCode::NOT_FOUND);
        let error = json_body(claimed).await;
        assert!(!error.to_string().contains(&owner_uid));

        let again = send(&app.router, "POST", "/api/v1/transactions", Some(&owner), Some(body)).await;
        assert_eq!(again.status(), StatusCode::CREATED);
        assert_eq!(json_body(again).await["uid"], owner_uid.as_str());
    }

    #[tokio::test]
    async fn waitlist_join_and_lookup() {
        let app = test_app();
        let joined = send(
            &app.router,
            "POST",
            "/api/v1/waitlist",
            None,
            Some(json!({ "email": "w@example.com", "name": "W" })),
        )
        .await;
        assert_eq!(joined.status(), StatusCode::CREATED);

        let found = send(&app.router, "GET", "/api/v1/waitlist/w@example.com", None, None).await;
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(json_body(found).await["allow"], false);

        let invalid = send(
            &app.router,
            "POST",
            "/api/v1/waitlist",
            None,
            Some(json!({ "email": "" })),
        )
        .await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
