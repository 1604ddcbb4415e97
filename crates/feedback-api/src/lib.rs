//! # feedback-api
//!
//! HTTP API layer for the feedback hub built on Axum.
//!
//! Provides the WebSocket upgrade endpoint, health checks, CORS and request
//! tracing middleware, response DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
