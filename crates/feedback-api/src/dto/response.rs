//! Response DTOs.

use serde::{Deserialize, Serialize};

use feedback_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Basic health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Detailed health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Live WebSocket connections.
    pub ws_connections: usize,
    /// Identities with a live connection.
    pub online_identities: usize,
    /// Hub counters.
    pub metrics: MetricsSnapshot,
}
