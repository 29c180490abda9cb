use std::io;

/// Unified error type for the schema engine.
///
/// Every operation in the crate returns this type. Item validators raise the
/// field-level variants; model operations never wrap them, so the calling
/// layer sees exactly what the failing field reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A field value violates its rule. The message names the field.
    #[error("{0}")]
    Validation(String),

    /// A required field was never set during creation.
    #[error("'{0}' is required")]
    Required(String),

    /// A unique constraint (optionally scoped by indexers) was violated.
    #[error("'{0}' must be unique")]
    Uniqueness(String),

    /// A relationship points to nothing, or its target model is unregistered.
    #[error("{0}")]
    Reference(String),

    /// A selector matched no document.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed data reached the engine (bad id, corrupt document, bad schema definition).
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The underlying store failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sled::Error> for SchemaError {
    fn from(error: sled::Error) -> Self {
        SchemaError::Database(error.to_string())
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(error: serde_json::Error) -> Self {
        SchemaError::Serialization(error.to_string())
    }
}

impl From<io::Error> for SchemaError {
    fn from(error: io::Error) -> Self {
        SchemaError::Config(error.to_string())
    }
}

impl From<toml::de::Error> for SchemaError {
    fn from(error: toml::de::Error) -> Self {
        SchemaError::Config(error.to_string())
    }
}

/// Result type alias for operations that can fail with a [`SchemaError`].
pub type SchemaResult<T> = Result<T, SchemaError>;
