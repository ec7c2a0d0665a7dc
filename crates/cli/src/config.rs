use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use client::ApiConfig;
use domain::models::Zone;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub check_in: CheckInConfig,
    /// Static zones, used when `check_in.zone_source` is `static`.
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where check-in zones come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneSource {
    #[default]
    Static,
    /// Derived from the geofenced tracks of the remote API.
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckInConfig {
    #[serde(default = "default_sensor_timeout")]
    pub sensor_timeout_ms: u64,

    #[serde(default)]
    pub zone_source: ZoneSource,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            sensor_timeout_ms: default_sensor_timeout(),
            zone_source: ZoneSource::default(),
        }
    }
}

impl CheckInConfig {
    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_millis(self.sensor_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

/// Shape of log lines on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_sensor_timeout() -> u64 {
    10_000
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".attendance/session.json")
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml, or the file given with `--config`
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with ATTENDANCE__ prefix
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let base = match path {
            Some(path) => config::File::from(path),
            None => config::File::with_name("config/default"),
        };

        let config = config::Config::builder()
            .add_source(base)
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("ATTENDANCE").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [api]
            base_url = "http://localhost:8080/api/v1"
            timeout_ms = 15000

            [check_in]
            sensor_timeout_ms = 10000
            zone_source = "static"

            [[zones]]
            id = "hq"
            name = "Head Office"
            latitude = 5.11883
            longitude = 7.36927
            radius = 15

            [session]
            path = "/tmp/attendance-test/session.json"

            [logging]
            level = "debug"
            format = "pretty"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "ATTENDANCE__API__BASE_URL must be set".to_string(),
            ));
        }

        if self.api.timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "api.timeout_ms cannot be 0".to_string(),
            ));
        }

        if self.check_in.sensor_timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "check_in.sensor_timeout_ms cannot be 0".to_string(),
            ));
        }

        if self.check_in.zone_source == ZoneSource::Static {
            let mut seen = HashSet::new();
            for zone in &self.zones {
                zone.validate().map_err(|e| {
                    ConfigValidationError::InvalidValue(format!("zone '{}': {}", zone.id, e))
                })?;
                if !seen.insert(zone.id.as_str()) {
                    return Err(ConfigValidationError::InvalidValue(format!(
                        "duplicate zone id '{}'",
                        zone.id
                    )));
                }
            }
        }

        Ok(())
    }
}
