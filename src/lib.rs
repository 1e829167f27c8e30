//! # operator-xp - Progression engine for ArmandoOS
//!
//! Tracks how far a visitor has explored the ArmandoOS portfolio: which
//! modules they opened, which module-specific interactions they performed,
//! which hidden signals they found. Exploration earns XP; XP drives a
//! "system understanding" percentage that gates Operator Mode and the
//! Executive Brief.
//!
//! ## Core Concepts
//!
//! - **`ProgressionStore`**: the single owner of progression state. All
//!   mutations go through it and are total: repeated actions are no-ops
//! - **`ProgressionSnapshot`**: read-only view of XP, unlocks, opened and
//!   completed modules, and per-module interaction state
//! - **Completion rules**: one predicate per module, evaluated after each
//!   interaction with that module
//! - **`ProgressStorage`**: where the persisted record lives (memory, file,
//!   or a write-behind decorator around either)
//! - **`NoRepeatRotator`**: shuffle-bag rotation used for rotating copy
//!
//! ## Usage
//!
//! ```rust
//! use operator_xp::{ModuleId, ProgressionStore};
//!
//! let mut store = ProgressionStore::in_memory();
//! store.open_module(ModuleId::Signal);
//! let outcome = store.signal_switch_tone();
//!
//! assert_eq!(outcome.completed, Some(ModuleId::Signal));
//! assert_eq!(store.snapshot().xp(), 50);
//! assert_eq!(store.snapshot().system_understanding(), 14);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod error;
pub mod ids;
pub mod module;

// Progression state machine
pub mod completion;
pub mod event;
pub mod progress;
pub mod snapshot;
pub mod store;
pub mod unlocks;

// Persistence
pub mod migration;
pub mod storage;

// Utilities
pub mod rotation;

pub use config::{ProgressionConfig, XpRules, DEFAULT_RECORD_NAME, DEFAULT_UNDERSTANDING_TARGET_XP};
pub use error::{ConfigError, MigrationError, ParseIdError, XpError, XpResult};
pub use event::{EventOutcome, ProgressEvent};
pub use ids::{CardId, StarId};
pub use migration::{LoadSource, CURRENT_SCHEMA_VERSION};
pub use module::{ModuleFlags, ModuleId};
pub use progress::ModuleProgress;
pub use rotation::NoRepeatRotator;
pub use snapshot::ProgressionSnapshot;
pub use storage::{InMemoryStorage, ProgressStorage, StorageError, WriteBehindConfig, WriteBehindStorage};
#[cfg(feature = "persistent")]
pub use storage::{open_file_storage, FileStorage, PersistentConfig};
pub use store::{Listener, ProgressionStore, SubscriptionId};
pub use unlocks::UnlockState;
