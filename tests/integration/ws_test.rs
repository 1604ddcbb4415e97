//! Integration tests for WebSocket upgrade parameter handling.

mod helpers;

use http::StatusCode;

const UPGRADE_HEADERS: &[(&str, &str)] = &[
    ("connection", "upgrade"),
    ("upgrade", "websocket"),
    ("sec-websocket-version", "13"),
    ("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ=="),
];

#[tokio::test]
async fn test_ws_upgrade_without_params() {
    let app = helpers::TestApp::new();

    let response = app.get("/ws", UPGRADE_HEADERS).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_ws_upgrade_rejects_zero_user_id() {
    let app = helpers::TestApp::new();

    let response = app.get("/ws?user_id=0&user_type=1", UPGRADE_HEADERS).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_ws_upgrade_rejects_unknown_role() {
    let app = helpers::TestApp::new();

    for role in ["0", "4", "admin", ""] {
        let response = app
            .get(&format!("/ws?user_id=7&user_type={role}"), UPGRADE_HEADERS)
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST, "user_type={role}");
        assert_eq!(response.body["error"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_ws_upgrade_rejects_repeated_query_key() {
    let app = helpers::TestApp::new();

    let response = app
        .get("/ws?user_id=7&user_id=8&user_type=1", UPGRADE_HEADERS)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert_eq!(app.engine.hub.connection_count(), 0);
}

#[tokio::test]
async fn test_ws_upgrade_validates_before_handshake() {
    let app = helpers::TestApp::new();

    // Bad parameters and no upgrade headers: the parameter error wins.
    let response = app.get("/ws?user_id=abc&user_type=1", &[]).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_ws_plain_request_with_valid_params_is_not_upgraded() {
    let app = helpers::TestApp::new();

    let response = app
        .get("/ws?user_id=7&user_type=1&user_name=alice", &[])
        .await;

    assert!(
        response.status.is_client_error(),
        "Expected a 4xx, got {}",
        response.status
    );
    assert_ne!(response.body["error"], "VALIDATION_ERROR");
    assert_eq!(app.engine.hub.connection_count(), 0);
}
