//! Daycare Check-In Desk Backend
//!
//! Serves the attendance roster to the check-in UI and writes check-ins and
//! check-outs through to the spreadsheet-backed Remote Roster Service.

mod api;
mod auth;
mod clock;
mod config;
mod errors;
mod models;
mod roster;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use roster::RosterClient;
use store::AttendanceStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AttendanceStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Daycare Check-In Desk");
    tracing::info!("Roster service: {}", config.roster_url);
    tracing::info!("Roster write method: {:?}", config.roster_write_method);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (DAYCARE_API_PSK). Authentication is disabled!");
    }

    let roster = RosterClient::new(
        &config.roster_url,
        config.roster_write_method,
        config.roster_timeout,
    )?;
    let store = Arc::new(AttendanceStore::new(roster));

    // An unreachable roster at startup is not fatal; the UI can reload.
    if let Err(e) = store.load().await {
        tracing::warn!("Initial roster load failed: {}", e);
    }

    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Roster
        .route("/children", get(api::list_children))
        .route("/children/counts", get(api::children_counts))
        .route("/children/{id}", get(api::get_child))
        .route("/children/{id}/status", get(api::get_child_status))
        .route("/children/{id}/record", get(api::get_child_record))
        .route("/children/{id}/check-in", post(api::check_in_child))
        .route("/children/{id}/check-out", post(api::check_out_child))
        // Today
        .route("/attendance", get(api::list_attendance))
        .route("/stats", get(api::get_stats))
        .route("/roster/reload", post(api::reload_roster))
        .route("/revision", get(api::get_revision))
        // History
        .route("/history", get(api::get_history))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod test_support;
