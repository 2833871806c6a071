//! Runtime configuration, read from the environment (and `.env` via dotenvy)

use std::env;

pub const DATABASE_URL_VAR: &str = "TRAINER_ZONES_DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "TRAINER_ZONES_MAX_CONNECTIONS";
pub const LOG_FORMAT_VAR: &str = "TRAINER_ZONES_LOG_FORMAT";

const DEFAULT_DATABASE_URL: &str = "sqlite://trainer-zones.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Invalid value for {name}: {value}")]
  InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
  #[default]
  Compact,
  Json,
}

impl std::str::FromStr for LogFormat {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "compact" | "text" => Ok(Self::Compact),
      "json" => Ok(Self::Json),
      _ => Err(format!("Unknown log format: {}", s)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
  pub database_url: String,
  pub max_connections: u32,
  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      max_connections: DEFAULT_MAX_CONNECTIONS,
      log_format: LogFormat::default(),
    }
  }
}

impl AppConfig {
  /// Read configuration from environment variables, falling back to defaults
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Ok(url) = env::var(DATABASE_URL_VAR) {
      if !url.trim().is_empty() {
        config.database_url = url;
      }
    }

    if let Ok(raw) = env::var(MAX_CONNECTIONS_VAR) {
      config.max_connections = raw
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(ConfigError::InvalidValue {
          name: MAX_CONNECTIONS_VAR,
          value: raw.clone(),
        })?;
    }

    if let Ok(raw) = env::var(LOG_FORMAT_VAR) {
      config.log_format = raw.parse().map_err(|_| ConfigError::InvalidValue {
        name: LOG_FORMAT_VAR,
        value: raw.clone(),
      })?;
    }

    Ok(config)
  }
}
