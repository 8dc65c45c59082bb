//! Axum router construction for the environment API.
//!
//! Assembles the routes into a single [`Router`] with permissive CORS so
//! browser frontends on any origin can drive the simulation.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for one environment service.
///
/// The router includes:
/// - `GET /` -- task and episode description
/// - `POST /reset` -- start a new episode
/// - `POST /step` -- apply one action
///
/// CORS allows any origin, method, and header.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::info))
        .route("/reset", post(handlers::reset))
        .route("/step", post(handlers::step))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
