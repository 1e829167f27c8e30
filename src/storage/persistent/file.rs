//! File-backed record storage.
//!
//! Each record lives in its own file named after the record. Writes go to a
//! temporary sibling first, are fsynced, then atomically renamed over the
//! previous file, so a crash mid-write leaves the old record intact.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::storage::traits::{ProgressStorage, StorageError};

use super::codec;
use super::PersistentConfig;

/// File extension used for record files.
pub const RECORD_EXTENSION: &str = "opxp";

/// Durable storage for one named record inside a directory.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    config: PersistentConfig,
}

impl FileStorage {
    /// Bind to `<dir>/<record_name>.opxp`, creating `dir` if needed.
    ///
    /// # Errors
    /// - If the directory cannot be created
    pub(super) fn open(dir: &Path, record_name: &str, config: PersistentConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{record_name}.{RECORD_EXTENSION}"));
        Ok(Self { path, config })
    }

    /// Returns the path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path
            .with_extension(format!("{RECORD_EXTENSION}.tmp.{}", Uuid::new_v4()))
    }

    fn write_atomically(&self, frame: &[u8]) -> std::io::Result<()> {
        let temp_path = self.temp_path();

        let result = (|| {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let mut writer = BufWriter::new(file);
            codec::write_header(&mut writer)?;
            writer.write_all(frame)?;
            writer.flush()?;

            if self.config.sync_on_write {
                writer.get_ref().sync_all()?;
            }

            fs::rename(&temp_path, &self.path)
        })();

        if result.is_err() && temp_path.exists() {
            // Best-effort cleanup; the original error is what matters.
            let _ = fs::remove_file(&temp_path);
        }

        result
    }
}

fn corrupted(err: &std::io::Error) -> StorageError {
    StorageError::Corrupted(err.to_string())
}

impl ProgressStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut reader = BufReader::new(file);

        let version = codec::read_header(&mut reader).map_err(|e| corrupted(&e))?;
        if version != codec::CODEC_VERSION {
            return Err(StorageError::Corrupted(format!(
                "unsupported file version {version} in {}",
                self.path.display()
            )));
        }

        let data = codec::decode(&mut reader, self.config.max_record_size).map_err(|e| corrupted(&e))?;

        String::from_utf8(data)
            .map(Some)
            .map_err(|e| StorageError::Corrupted(format!("record is not valid UTF-8: {e}")))
    }

    fn save(&self, payload: &str) -> Result<(), StorageError> {
        if payload.len() > self.config.max_record_size {
            return Err(StorageError::Unavailable(format!(
                "record of {} bytes exceeds maximum {}",
                payload.len(),
                self.config.max_record_size
            )));
        }

        let frame = codec::encode(payload.as_bytes())?;
        self.write_atomically(&frame)?;
        Ok(())
    }
}
