use crate::error::{SchemaError, SchemaResult};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path where the sled database lives
    pub storage_path: PathBuf,
    /// Use a throwaway database that is deleted when dropped
    pub temporary: bool,
    /// Flush every write to disk before returning
    pub flush_on_write: bool,
    /// Depth used by [`ProjectionOptions::expanded_default`](crate::schema::ProjectionOptions::expanded_default).
    /// Must be greater than 0
    pub default_expand_max_depth: u32,
    /// Logging settings
    pub logging: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("data"),
            temporary: false,
            flush_on_write: true,
            default_expand_max_depth: 1,
            logging: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration storing data under `storage_path`
    pub fn new(storage_path: PathBuf) -> Self {
        Self {
            storage_path,
            ..Default::default()
        }
    }

    /// Configuration for a database that disappears with the process
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            flush_on_write: false,
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: EngineConfig = toml::from_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DOCSCHEMA_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> SchemaResult<()> {
        if let Ok(path) = std::env::var("DOCSCHEMA_STORAGE_PATH") {
            self.storage_path = PathBuf::from(path);
        }
        if let Ok(temporary) = std::env::var("DOCSCHEMA_TEMPORARY") {
            self.temporary = parse_flag("DOCSCHEMA_TEMPORARY", &temporary)?;
        }
        if let Ok(flush) = std::env::var("DOCSCHEMA_FLUSH_ON_WRITE") {
            self.flush_on_write = parse_flag("DOCSCHEMA_FLUSH_ON_WRITE", &flush)?;
        }
        if let Ok(depth) = std::env::var("DOCSCHEMA_EXPAND_MAX_DEPTH") {
            self.default_expand_max_depth = depth.parse().map_err(|_| {
                SchemaError::Config(format!("DOCSCHEMA_EXPAND_MAX_DEPTH: '{}' is not a number", depth))
            })?;
        }
        self.logging.apply_env_overrides();
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> SchemaResult<()> {
        if self.default_expand_max_depth == 0 {
            return Err(SchemaError::Config(
                "default_expand_max_depth must be greater than 0".to_string(),
            ));
        }
        if !self.temporary && self.storage_path.as_os_str().is_empty() {
            return Err(SchemaError::Config("storage_path cannot be empty".to_string()));
        }
        self.logging
            .validate()
            .map_err(|e| SchemaError::Config(e.to_string()))
    }
}

fn parse_flag(name: &str, value: &str) -> SchemaResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(SchemaError::Config(format!("{}: '{}' is not a boolean", name, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "storage_path = \"/tmp/docschema-test\"\ndefault_expand_max_depth = 3\n\n[logging]\ndefault_level = \"DEBUG\""
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_expand_max_depth, 3);
        assert_eq!(config.logging.default_level, "DEBUG");
        assert!(config.flush_on_write);
    }

    #[test]
    fn zero_depth_is_rejected() {
        let config = EngineConfig {
            default_expand_max_depth: 0,
            ..EngineConfig::temporary()
        };
        assert!(matches!(config.validate(), Err(SchemaError::Config(_))));
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
