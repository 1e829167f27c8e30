//! Error types for operator-xp.
//!
//! Event operations on the progression store are total and never return
//! errors. The types here cover the edges where something can actually go
//! wrong: configuration, persisted-record migration and the storage port.
//! Migration errors never escape the loader; they are logged and recovered.
//! All of them are strongly typed using thiserror.

use thiserror::Error;

use crate::storage::StorageError;

/// Configuration errors raised by `validate()` on config structs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("understanding target must be greater than zero")]
    ZeroUnderstandingTarget,

    #[error("record name cannot be empty")]
    EmptyRecordName,

    #[error("record name '{name}' contains invalid character {character:?}")]
    InvalidRecordName {
        name: String,
        character: char,
    },

    #[error("Field '{field}' must be at least {min} (got {actual})")]
    BelowMinimum {
        field: String,
        min: u64,
        actual: u64,
    },
}

/// Errors produced while decoding or upgrading a persisted record.
///
/// The loader always recovers from these by falling back to the default
/// snapshot; they exist so the fallback can be logged precisely.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Persisted record is malformed: {reason}")]
    MalformedRecord {
        reason: String,
    },

    #[error("Migration from v{from} to v{to} failed: {reason}")]
    StepFailed {
        from: u32,
        to: u32,
        reason: String,
    },

    #[error("Failed to decode persisted state: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error returned when a string does not name a known module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown module id: {value}")]
pub struct ParseIdError {
    /// The rejected input.
    pub value: String,
}

/// Top-level error type for operator-xp.
///
/// Only opening a store or a storage backend can fail; event operations are
/// total and persisted-record problems are recovered inside the loader.
#[derive(Debug, Error)]
pub enum XpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl XpError {
    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for operator-xp operations.
pub type XpResult<T> = Result<T, XpError>;
