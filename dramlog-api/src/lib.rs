//! dramlog-api library
//!
//! HTTP/JSON API for the dramlog whisky tasting log. Exposes the router and
//! application state so integration tests can drive the service in-process.

use axum::Router;
use chrono::{DateTime, Utc};
use dramlog_common::events::EventBus;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus feeding the SSE stream
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus) -> Self {
        Self {
            db,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Reads are public. Writes require a bearer API key; badge and store writes
/// additionally require an admin caller (checked in the handlers).
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/tastings", post(api::create_tasting))
        .route("/bottles", post(api::create_bottle))
        .route("/entities", post(api::create_entity))
        .route("/badges", post(api::create_badge))
        .route("/stores", post(api::create_store))
        .route("/stores/:id/prices", post(api::ingest_prices))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_auth,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/tastings/:id", get(api::get_tasting))
        .route("/bottles/:id", get(api::get_bottle))
        .route("/bottles/:id/tastings", get(api::list_bottle_tastings))
        .route("/bottles/:id/tags", get(api::get_bottle_tags))
        .route("/bottles/:id/prices", get(api::get_bottle_prices))
        .route("/entities/:id", get(api::get_entity))
        .route("/badges", get(api::list_badges))
        .route("/badges/:id", get(api::get_badge))
        .route("/users/:id/awards", get(api::list_user_awards))
        .route("/users/:id/tags", get(api::list_user_tags))
        .route("/events", get(api::event_stream))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
