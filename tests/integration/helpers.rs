//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use feedback_api::{AppState, build_app};
use feedback_core::config::AppConfig;
use feedback_realtime::RealtimeEngine;
use feedback_realtime::notification::StaticOperators;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Realtime engine behind the router
    pub engine: RealtimeEngine,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.operators.ids = vec![100, 101];

        let operators = Arc::new(StaticOperators::new(config.operators.ids.iter().copied()));
        let engine = RealtimeEngine::start(&config.realtime, operators);
        let router = build_app(AppState::new(Arc::new(config), engine.clone()));

        Self { router, engine }
    }

    /// Serve the router on an ephemeral local port and return its address
    #[allow(dead_code)]
    pub async fn serve(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });
        addr
    }

    /// Send a GET request with optional extra headers
    pub async fn get(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut req = Request::builder().method("GET").uri(path);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let req = req.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Test response wrapper
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (`Null` if not JSON)
    pub body: Value,
}
