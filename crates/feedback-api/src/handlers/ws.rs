//! WebSocket upgrade handler.

use axum::extract::rejection::QueryRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use feedback_core::error::AppError;

use crate::dto::request::WsConnectQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /ws?user_id={id}&user_type={1|2|3}&user_name={name}: WebSocket upgrade
///
/// Parameters are validated before the upgrade; a bad identity or an
/// unparseable query string fails with `400 VALIDATION_ERROR` and no
/// connection is created.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    query: Result<Query<WsConnectQuery>, QueryRejection>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        AppError::validation(format!("Invalid query string: {}", rejection.body_text()))
    })?;
    let (identity, display_name) = query.into_identity()?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!(identity = %identity, reason = %rejection, "WebSocket upgrade rejected");
            return Ok(rejection.into_response());
        }
    };

    info!(
        principal_id = %identity.id,
        role = %identity.role,
        name = %display_name,
        "Upgrading WebSocket connection"
    );

    let engine = state.realtime.clone();
    Ok(ws
        .max_message_size(state.config.realtime.max_frame_bytes)
        .on_failed_upgrade(move |e| warn!(identity = %identity, error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| async move {
            engine.serve(socket, identity, display_name).await;
        }))
}
