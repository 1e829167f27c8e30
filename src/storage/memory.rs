//! In-memory storage backend.
//!
//! Thread-safe implementation of [`ProgressStorage`] backed by a single
//! payload slot. It is intended for embedded usage, tests, and as a reference
//! implementation. Tests can seed a payload directly or make writes fail to
//! exercise the store's fire-and-forget persistence.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use crate::storage::traits::{ProgressStorage, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory record store.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    payload: RwLock<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl InMemoryStorage {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `payload`.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: RwLock::new(Some(payload.into())),
            ..Self::default()
        }
    }

    /// Make every subsequent `save` fail with `Unavailable` (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current payload, bypassing the port. Returns `None` on a poisoned lock.
    #[must_use]
    pub fn peek(&self) -> Option<String> {
        self.payload.read().ok().and_then(|p| p.clone())
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl ProgressStorage for InMemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let guard = self.payload.read().map_err(|_| lock_err("memory.load"))?;
        Ok(guard.clone())
    }

    fn save(&self, payload: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        let mut guard = self.payload.write().map_err(|_| lock_err("memory.save"))?;
        *guard = Some(payload.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
