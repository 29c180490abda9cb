//! Configuration management for the logging system
//!
//! Handles the log level settings loaded from TOML and environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const VALID_LEVELS: [&str; 6] = ["OFF", "TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// Main logging configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level for all modules
    pub default_level: String,
    /// Per-module log levels, keyed by module path below the crate root
    /// (for example `model` or `schema::types`).
    pub features: HashMap<String, String>,
    /// Write timestamps on every line
    pub include_timestamp: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "INFO".to_string(),
            features: Self::default_features(),
            include_timestamp: true,
        }
    }
}

impl LogConfig {
    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("DOCSCHEMA_LOG_LEVEL") {
            self.default_level = level.to_uppercase();
        }

        for (key, value) in std::env::vars() {
            if let Some(feature) = key.strip_prefix("DOCSCHEMA_LOG_FEATURE_") {
                self.features
                    .insert(feature.to_lowercase(), value.to_uppercase());
            }
        }
    }

    fn default_features() -> HashMap<String, String> {
        let mut features = HashMap::new();
        features.insert("db_operations".to_string(), "WARN".to_string());
        features.insert("model".to_string(), "INFO".to_string());
        features.insert("schema".to_string(), "INFO".to_string());
        features
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LEVELS.contains(&self.default_level.as_str()) {
            return Err(ConfigError::InvalidLevel(self.default_level.clone()));
        }

        for (feature, level) in &self.features {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::InvalidFeatureLevel(
                    feature.clone(),
                    level.clone(),
                ));
            }
        }

        Ok(())
    }
}

/// Parses one of the accepted level names.
pub fn parse_level(level: &str) -> Result<log::LevelFilter, ConfigError> {
    match level {
        "OFF" => Ok(log::LevelFilter::Off),
        "TRACE" => Ok(log::LevelFilter::Trace),
        "DEBUG" => Ok(log::LevelFilter::Debug),
        "INFO" => Ok(log::LevelFilter::Info),
        "WARN" => Ok(log::LevelFilter::Warn),
        "ERROR" => Ok(log::LevelFilter::Error),
        other => Err(ConfigError::InvalidLevel(other.to_string())),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
    #[error("Invalid log level for feature '{0}': {1}")]
    InvalidFeatureLevel(String, String),
}
