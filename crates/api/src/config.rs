//! Server configuration
//!
//! Loaded from an optional TOML file (`movement-coach.toml`, or the path in
//! `COACH_CONFIG`) with `COACH_`-prefixed environment variables layered on
//! top, nested keys separated by `__` (e.g. `COACH_ENGINE__GATE__MIN_COVERAGE`).

use analysis_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "movement-coach.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub mock: MockConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            metrics: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Synthetic frame source and detector used in place of a decoder and model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Frames every video yields
    pub frames: u32,
    /// Frames per synthetic squat repetition
    pub squat_period: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            frames: 60,
            squat_period: 30,
        }
    }
}

impl AppConfig {
    /// Load from `path` (optional) and the environment
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("COACH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load from the file named by `COACH_CONFIG`, or the default file
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let path = std::env::var("COACH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.engine.cache.capacity, 256);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("does-not-exist/movement-coach").unwrap();
        assert_eq!(config.mock.frames, 60);
        assert_eq!(config.engine.gate.min_frames, 10);
    }
}
