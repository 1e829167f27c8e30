//! Storage port and backends for persisted progression records.
//!
//! The trait lives in `traits`; backends are provided in separate modules.

mod traits;

/// In-memory backend.
pub mod memory;
/// File-backed durable backend.
#[cfg(feature = "persistent")]
pub mod persistent;
/// Background-writer decorator.
pub mod write_behind;

pub use memory::InMemoryStorage;
#[cfg(feature = "persistent")]
pub use persistent::{open_file_storage, FileStorage, PersistentConfig};
pub use traits::{ProgressStorage, StorageError};
pub use write_behind::{WriteBehindConfig, WriteBehindStorage};
