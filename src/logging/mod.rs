//! # Logging
//!
//! The engine logs through the `log` facade. This module wires the facade to
//! `env_logger` according to a [`LogConfig`]; embedding applications that
//! already install a logger can skip it entirely.

pub mod config;

pub use config::{ConfigError, LogConfig};

use once_cell::sync::OnceCell;

static INITIALIZED: OnceCell<LogConfig> = OnceCell::new();

/// Installs `env_logger` with the levels from `config`.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    config.validate()?;

    let mut builder = env_logger::Builder::new();
    builder.filter_level(config::parse_level(&config.default_level)?);
    for (feature, level) in &config.features {
        let module = format!("{}::{}", env!("CARGO_CRATE_NAME"), feature);
        builder.filter_module(&module, config::parse_level(level)?);
    }
    if !config.include_timestamp {
        builder.format_timestamp(None);
    }

    INITIALIZED
        .set(config.clone())
        .map_err(|_| LoggingError::AlreadyInitialized)?;
    builder
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}

/// Returns the configuration logging was initialised with, if any.
pub fn active_config() -> Option<&'static LogConfig> {
    INITIALIZED.get()
}

/// Logging system errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("Failed to install logger: {0}")]
    Install(String),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        let config = LogConfig::default();
        // A logger may already be installed in this process, so only the
        // second call's outcome is fixed.
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::AlreadyInitialized)
        ));
        assert!(active_config().is_some());
    }
}
