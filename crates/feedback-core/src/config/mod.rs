//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate. Each
//! sub-module represents a logical configuration section, and every field
//! carries a serde default so an empty configuration is valid.

pub mod app;
pub mod logging;
pub mod realtime;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;

use crate::result::AppResult;

/// Root application configuration.
///
/// Deserialization target for `config/default.toml`, the environment
/// overlay, and `FEEDBACK__*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Realtime hub settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Operator directory used when mirroring notifications.
    #[serde(default)]
    pub operators: OperatorsConfig,
}

/// Static operator directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorsConfig {
    /// Principal IDs of every operator account.
    #[serde(default)]
    pub ids: Vec<u64>,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default`, the `config/{env}` overlay, and environment
    /// variables prefixed with `FEEDBACK__`, then validates the result.
    pub fn load(env: &str) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FEEDBACK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;

        app.validate()?;
        Ok(app)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> AppResult<()> {
        self.realtime.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_valid() {
        let config: AppConfig = serde_json::from_str("{}").expect("deserialize");
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.realtime.outbound_buffer_size, 256);
        assert!(config.operators.ids.is_empty());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"realtime":{"pong_wait_seconds":20},"operators":{"ids":[3,4]}}"#)
                .expect("deserialize");
        assert_eq!(config.realtime.pong_wait_seconds, 20);
        assert_eq!(config.realtime.max_frame_bytes, 512 * 1024);
        assert_eq!(config.operators.ids, vec![3, 4]);
    }
}
