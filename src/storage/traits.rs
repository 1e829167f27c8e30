//! Abstract storage port for persisted progression records.
//!
//! The progression store never touches durable storage directly. It talks to a
//! `ProgressStorage` implementation bound to a single named record, which lets
//! us swap in:
//! - An in-memory backend for tests and embedded use
//! - A file backend for desktop/native hosts
//! - A write-behind decorator that moves writes off the caller's thread

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O failure talking to the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes failed an integrity check.
    #[error("Stored record is corrupted: {0}")]
    Corrupted(String),

    /// Backend refused the operation (poisoned lock, injected failure).
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Backend is temporarily unable to accept writes (quota, shutdown).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns true if a later attempt at the same operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

/// Storage port for one persisted progression record.
///
/// Payloads are opaque strings (serialized JSON records); decoding and
/// migration happen above this layer so that corrupt data can be recovered
/// from without involving the backend.
pub trait ProgressStorage: Send + Sync {
    /// Read the current payload. Returns `Ok(None)` when nothing was stored yet.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored payload.
    fn save(&self, payload: &str) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the port is object-safe
    fn _assert_progress_storage_object_safe(_: &dyn ProgressStorage) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Corrupted("crc mismatch".to_string());
        assert!(err.to_string().contains("corrupted"));

        let err = StorageError::Backend("poisoned lock: memory.save".to_string());
        assert!(err.to_string().contains("poisoned lock"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(StorageError::Unavailable("quota".into()).is_transient());
        assert!(!StorageError::Corrupted("bad".into()).is_transient());
        assert!(!StorageError::Backend("bad".into()).is_transient());
    }
}
