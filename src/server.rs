use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::AppState;

/// Builds the full Axum `Router`.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Instrumentation ingest ──────────────────────────────
        .route("/api/samples", post(handlers::profile::ingest_samples))
        // ── Profile ─────────────────────────────────────────────
        .route("/api/profile", get(handlers::stream::get_profile))
        .route("/api/profile/stream", get(handlers::stream::profile_stream))
        .route("/api/profile/send", post(handlers::profile::send_profile))
        .route("/api/profile/reset", post(handlers::profile::reset_profile))
        .route(
            "/api/profile/distribution/:metric",
            get(handlers::profile::get_distribution),
        )
        // ── Simulation control ──────────────────────────────────
        .route(
            "/api/simulation/start",
            post(handlers::simulation::start_simulation),
        )
        .route(
            "/api/simulation/stop",
            post(handlers::simulation::stop_simulation),
        )
        .route(
            "/api/simulation/status",
            get(handlers::simulation::simulation_status),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
}
