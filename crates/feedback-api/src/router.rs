//! Route definitions for the feedback hub HTTP surface.

use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, threading `AppState` through `.with_state`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .with_state(state)
}

/// Liveness and hub statistics
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
