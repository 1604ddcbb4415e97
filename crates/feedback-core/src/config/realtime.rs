//! Realtime hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Realtime (WebSocket) hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound buffer. A full buffer marks the
    /// peer as dead.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Maximum inbound frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Read deadline in seconds, renewed on every pong and inbound frame.
    #[serde(default = "default_pong_wait")]
    pub pong_wait_seconds: u64,
    /// Write deadline in seconds for a single outbound frame.
    #[serde(default = "default_write_wait")]
    pub write_wait_seconds: u64,
    /// Heartbeat interval in seconds. Defaults to 9/10 of `pong_wait_seconds`.
    #[serde(default)]
    pub ping_interval_seconds: Option<u64>,
    /// Capacity of the hub command queue. Producers wait when it is full.
    #[serde(default = "default_hub_queue")]
    pub hub_queue_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            max_frame_bytes: default_max_frame_bytes(),
            pong_wait_seconds: default_pong_wait(),
            write_wait_seconds: default_write_wait(),
            ping_interval_seconds: None,
            hub_queue_size: default_hub_queue(),
        }
    }
}

impl RealtimeConfig {
    /// Read deadline as a [`Duration`].
    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_seconds)
    }

    /// Per-frame write deadline as a [`Duration`].
    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_seconds)
    }

    /// Heartbeat interval. Must stay strictly below [`Self::pong_wait`].
    pub fn ping_interval(&self) -> Duration {
        match self.ping_interval_seconds {
            Some(secs) => Duration::from_secs(secs),
            None => self.pong_wait() * 9 / 10,
        }
    }

    /// Validates heartbeat and buffer settings.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.outbound_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.outbound_buffer_size must be greater than zero",
            ));
        }
        if self.hub_queue_size == 0 {
            return Err(AppError::configuration(
                "realtime.hub_queue_size must be greater than zero",
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(AppError::configuration(
                "realtime.max_frame_bytes must be greater than zero",
            ));
        }
        let ping = self.ping_interval();
        if ping.is_zero() || ping >= self.pong_wait() {
            return Err(AppError::configuration(format!(
                "realtime heartbeat interval ({ping:?}) must be non-zero and shorter than pong wait ({:?})",
                self.pong_wait()
            )));
        }
        Ok(())
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_hub_queue() -> usize {
    1024
}

fn default_max_frame_bytes() -> usize {
    512 * 1024
}

fn default_pong_wait() -> u64 {
    60
}

fn default_write_wait() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ping_is_nine_tenths_of_pong_wait() {
        let config = RealtimeConfig::default();
        assert_eq!(config.ping_interval(), Duration::from_secs(54));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ping_not_shorter_than_pong_wait_is_rejected() {
        let config = RealtimeConfig {
            ping_interval_seconds: Some(60),
            ..RealtimeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_hub_queue_is_rejected() {
        let config = RealtimeConfig {
            hub_queue_size: 0,
            ..RealtimeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_buffer_is_rejected() {
        let config = RealtimeConfig {
            outbound_buffer_size: 0,
            ..RealtimeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
