//! Error types for platevote.
//!
//! This module defines all error types used throughout the platevote crate.
//! The first four variants form the domain taxonomy callers are expected to
//! render; the rest carry ambient failures from the database, configuration,
//! and I/O layers.

use thiserror::Error;

/// The main error type for platevote operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Domain Errors ===
    /// The plate text was empty after normalization, or failed the configured pattern.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was rejected.
        message: String,
    },

    /// A vote delta outside {+1, -1}, or any other schema constraint breach.
    #[error("constraint violation: {message}")]
    ConstraintViolation {
        /// Description of the violated constraint.
        message: String,
    },

    /// A persisted database image could not be restored.
    #[error("corrupt database image: {reason}")]
    CorruptImage {
        /// Why the image was rejected.
        reason: String,
    },

    /// The blob store could not be read or written.
    #[error("storage unavailable for '{key}': {message}")]
    StorageUnavailable {
        /// The blob key involved.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Storage Errors ===
    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for platevote operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new constraint violation error.
    #[must_use]
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Create a new corrupt image error.
    #[must_use]
    pub fn corrupt_image(reason: impl Into<String>) -> Self {
        Self::CorruptImage {
            reason: reason.into(),
        }
    }

    /// Create a storage unavailable error for the given blob key.
    #[must_use]
    pub fn storage_unavailable(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Convert a `SQLite` error raised while writing, mapping constraint
    /// failures to [`Error::ConstraintViolation`].
    #[must_use]
    pub fn from_write(err: rusqlite::Error) -> Self {
        if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
            Self::constraint_violation(err.to_string())
        } else {
            Self::DatabaseQuery(err)
        }
    }

    /// Check if this error is an invalid input rejection.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Check if this error is a constraint violation.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }

    /// Check if this error indicates an unreadable image.
    #[must_use]
    pub fn is_corrupt_image(&self) -> bool {
        matches!(self, Self::CorruptImage { .. })
    }

    /// Check if this error is a blob store failure.
    #[must_use]
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_input("plate text is empty");
        assert_eq!(err.to_string(), "invalid input: plate text is empty");

        let err = Error::constraint_violation("vote value must be +1 or -1, got 2");
        assert_eq!(
            err.to_string(),
            "constraint violation: vote value must be +1 or -1, got 2"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(Error::invalid_input("x").is_invalid_input());
        assert!(Error::constraint_violation("x").is_constraint_violation());
        assert!(Error::corrupt_image("x").is_corrupt_image());
        assert!(Error::storage_unavailable("db", "x").is_storage_unavailable());

        assert!(!Error::constraint_violation("x").is_invalid_input());
        assert!(!Error::invalid_input("x").is_corrupt_image());
    }

    #[test]
    fn test_storage_unavailable_display() {
        let err = Error::storage_unavailable("database", "disk full");
        let msg = err.to_string();
        assert!(msg.contains("database"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_corrupt_image_display() {
        let err = Error::corrupt_image("checksum mismatch");
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_from_write_maps_constraint_failures() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER CHECK (v IN (-1, 1)))")
            .unwrap();
        let sqlite_err = conn.execute("INSERT INTO t (v) VALUES (5)", []).unwrap_err();

        let err = Error::from_write(sqlite_err);
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_from_write_passes_other_errors_through() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let sqlite_err = conn
            .execute("INSERT INTO missing (v) VALUES (1)", [])
            .unwrap_err();

        let err = Error::from_write(sqlite_err);
        assert!(matches!(err, Error::DatabaseQuery(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "limit must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("limit must be greater than 0"));
    }
}
