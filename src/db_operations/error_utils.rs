//! Error handling utilities for store operations
//!
//! Keeps the wording of storage and serialization failures consistent across
//! the collection implementations.

use crate::error::SchemaError;

/// Utility functions for common error handling patterns in store operations
pub struct ErrorUtils;

impl ErrorUtils {
    /// Creates a serialization error with consistent formatting
    pub fn serialization_error(context: &str, error: serde_json::Error) -> SchemaError {
        SchemaError::Serialization(format!("Serialization failed for {}: {}", context, error))
    }

    /// Creates a deserialization error with consistent formatting
    pub fn deserialization_error(context: &str, error: serde_json::Error) -> SchemaError {
        SchemaError::Serialization(format!("Deserialization failed for {}: {}", context, error))
    }

    /// Creates a database operation error with consistent formatting
    pub fn database_error(operation: &str, error: sled::Error) -> SchemaError {
        SchemaError::Database(format!("{} failed: {}", operation, error))
    }

    /// Creates a lock acquisition error with consistent formatting
    pub fn lock_error(resource: &str) -> SchemaError {
        SchemaError::InvalidData(format!("Failed to acquire lock for {}", resource))
    }

    /// Creates a not found error with consistent formatting
    pub fn not_found_error(resource_type: &str, identifier: &str) -> SchemaError {
        SchemaError::NotFound(format!("{} '{}' not found", resource_type, identifier))
    }

    /// Helper for converting sled errors in store operations
    pub fn from_sled_error(operation: &str) -> impl Fn(sled::Error) -> SchemaError + '_ {
        move |e| Self::database_error(operation, e)
    }

    /// Helper for converting serialization errors
    pub fn from_serialization_error(
        context: &str,
    ) -> impl Fn(serde_json::Error) -> SchemaError + '_ {
        move |e| Self::serialization_error(context, e)
    }

    /// Helper for converting deserialization errors
    pub fn from_deserialization_error(
        context: &str,
    ) -> impl Fn(serde_json::Error) -> SchemaError + '_ {
        move |e| Self::deserialization_error(context, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting() {
        let sled_err = sled::Error::Unsupported("test".to_string());
        let db_error = ErrorUtils::database_error("insert", sled_err);
        assert!(matches!(db_error, SchemaError::Database(_)));
        assert!(db_error.to_string().contains("insert failed"));

        if let Err(json_err) = serde_json::from_str::<serde_json::Value>("invalid json") {
            let ser_error = ErrorUtils::deserialization_error("document", json_err);
            assert!(matches!(ser_error, SchemaError::Serialization(_)));
        }
    }

    #[test]
    fn test_not_found_error() {
        let error = ErrorUtils::not_found_error("Document", "507f191e810c19729de860ea");
        assert!(matches!(error, SchemaError::NotFound(_)));
    }

    #[test]
    fn test_lock_error() {
        let error = ErrorUtils::lock_error("model registry");
        assert!(matches!(error, SchemaError::InvalidData(_)));
    }
}
