//! Integration tests for health endpoints.

mod helpers;

use std::sync::Arc;

use http::StatusCode;

use feedback_core::types::{IdentityKey, PrincipalRole};
use feedback_realtime::Connection;

#[tokio::test]
async fn test_health_check() {
    let app = helpers::TestApp::new();

    let response = app.get("/api/health", &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_detailed_health_check_on_idle_hub() {
    let app = helpers::TestApp::new();

    let response = app.get("/api/health/detailed", &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["ws_connections"], 0);
    assert_eq!(data["online_identities"], 0);
    assert_eq!(data["metrics"]["connections_opened"], 0);
}

#[tokio::test]
async fn test_detailed_health_counts_live_connections() {
    let app = helpers::TestApp::new();
    let key = IdentityKey::new(5, PrincipalRole::Organization);

    let (first, _first_rx) = Connection::new(key, "Acme", 8);
    let (second, _second_rx) = Connection::new(key, "Acme", 8);
    app.engine.hub.register(Arc::clone(&first)).await;
    app.engine.hub.register(Arc::clone(&second)).await;
    app.engine.hub.flush().await;

    let response = app.get("/api/health/detailed", &[]).await;

    let data = &response.body["data"];
    assert_eq!(data["ws_connections"], 1);
    assert_eq!(data["online_identities"], 1);
    assert_eq!(data["metrics"]["connections_opened"], 2);
    assert_eq!(data["metrics"]["evictions"], 1);
    assert!(first.is_closed());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = helpers::TestApp::new();

    let response = app.get("/api/tickets", &[]).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
