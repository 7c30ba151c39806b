//! mitta-api server entry point.
//!
//! Wires the datastore, object storage and index adapters chosen by the
//! environment, starts the event sweeper and ledger cleanup, and serves
//! the REST API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mitta_api::api;
use mitta_api::app_state::AppState;
use mitta_api::config::ServiceConfig;
use mitta_api::index::{IndexProvisioner, NoopProvisioner, SolrProvisioner};
use mitta_api::persistence::{Datastore, MemoryDatastore, PostgresDatastore};
use mitta_api::storage::{BlobStore, GcsBlobStore, MemoryBlobStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServiceConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!(addr = %config.listen_addr, "starting mitta-api");

    // Build adapters
    let store: Arc<dyn Datastore> = if config.persistence_enabled {
        Arc::new(
            PostgresDatastore::connect(&config)
                .await
                .context("failed to connect to postgres")?,
        )
    } else {
        tracing::warn!("persistence disabled, using in-memory datastore");
        Arc::new(MemoryDatastore::new())
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("failed to build http client")?;

    let blobs: Arc<dyn BlobStore> = if config.storage_enabled {
        Arc::new(GcsBlobStore::new(
            http.clone(),
            config.storage_base_url.clone(),
            config.storage_bucket.clone(),
            config.storage_access_token.clone(),
        ))
    } else {
        tracing::warn!("object storage disabled, spool listings will be empty");
        Arc::new(MemoryBlobStore::new())
    };

    let index: Arc<dyn IndexProvisioner> = if config.index_enabled {
        Arc::new(SolrProvisioner::new(
            http,
            config.index_port,
            config.index_provision_retries,
        ))
    } else {
        tracing::warn!("index provisioning disabled");
        Arc::new(NoopProvisioner)
    };

    // Build application state
    let app_state = AppState::new(store, blobs, index, &config);
    let _sweeper = match config.event_sweep_interval() {
        Some(every) => Some(app_state.events.spawn_sweeper(every)),
        None => {
            tracing::info!("event sweeper disabled, expired events are removed on pop");
            None
        }
    };
    let _ledger_cleanup = match config.ledger_cleanup() {
        Some((every, retention)) => {
            tracing::info!(retention_days = retention.num_days(), "ledger cleanup scheduled");
            Some(app_state.ledger.spawn_cleanup(every, retention))
        }
        None => {
            tracing::info!("ledger cleanup disabled");
            None
        }
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
