//! Shared application state passed to every handler.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use feedback_core::config::AppConfig;
use feedback_realtime::RealtimeEngine;

/// Application state. Cheap to clone; everything inside is shared.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Realtime hub engine.
    pub realtime: RealtimeEngine,
    /// Process start time, for uptime reporting.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates state stamped with the current time.
    pub fn new(config: Arc<AppConfig>, realtime: RealtimeEngine) -> Self {
        Self {
            config,
            realtime,
            started_at: Utc::now(),
        }
    }

    /// Whole seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}
