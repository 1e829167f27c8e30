//! Persistent storage backend for operator-xp.
//!
//! This module provides durable, crash-safe record storage with:
//! - Atomic temp-file-then-rename writes
//! - CRC32 checksums for corruption detection
//! - A versioned file header
//!
//! # Layout
//!
//! ```text
//! <dir>/
//! └── <record_name>.opxp   [magic "OPXP"][codec version][frame: version|len|json|crc32]
//! ```

mod codec;
mod file;

pub use file::{FileStorage, RECORD_EXTENSION};

use std::path::Path;

use crate::error::{ConfigError, XpError};

/// Configuration for persistent storage.
#[derive(Debug, Clone)]
pub struct PersistentConfig {
    /// Whether to fsync after every write (slower but safer).
    pub sync_on_write: bool,
    /// Maximum record size (bytes) accepted on write and on read.
    pub max_record_size: usize,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
            max_record_size: 1024 * 1024, // 1 MiB
        }
    }
}

impl PersistentConfig {
    const MIN_RECORD_SIZE: usize = 4 * 1024; // 4 KiB minimum so a full snapshot always fits

    /// Check the configuration, returning it unchanged when valid.
    ///
    /// # Errors
    /// - `ConfigError::BelowMinimum` if `max_record_size` is under 4 KiB
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_record_size < Self::MIN_RECORD_SIZE {
            return Err(ConfigError::BelowMinimum {
                field: "max_record_size".to_string(),
                min: Self::MIN_RECORD_SIZE as u64,
                actual: self.max_record_size as u64,
            });
        }
        Ok(self)
    }
}

/// Open (or prepare) file storage for `record_name` inside `dir`.
///
/// # Arguments
/// * `dir` - Directory holding record files (created if missing)
/// * `record_name` - Record name, e.g. [`crate::config::DEFAULT_RECORD_NAME`]
/// * `config` - Optional configuration (uses defaults if None)
///
/// # Errors
/// - If the configuration or record name is invalid
/// - If the directory cannot be created
///
/// # Example
/// ```rust,ignore
/// use std::sync::Arc;
/// use operator_xp::storage::persistent::open_file_storage;
/// use operator_xp::{ProgressionConfig, ProgressionStore};
///
/// let storage = open_file_storage("./profile", "armando-os-xp-store", None)?;
/// let store = ProgressionStore::open(ProgressionConfig::default(), Arc::new(storage))?;
/// ```
pub fn open_file_storage(
    dir: impl AsRef<Path>,
    record_name: &str,
    config: Option<PersistentConfig>,
) -> Result<FileStorage, XpError> {
    let cfg = config.unwrap_or_default().validate()?;
    crate::config::validate_record_name(record_name)?;
    Ok(FileStorage::open(dir.as_ref(), record_name, cfg)?)
}
