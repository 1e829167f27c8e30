//! Versioned persisted records and schema migration.
//!
//! A persisted record is a JSON envelope:
//!
//! ```text
//! {"state": { ...PersistedProgress keys... }, "version": 2, "savedAt": "2026-..."}
//! ```
//!
//! Older records are upgraded by an ordered list of pure steps, each taking the
//! raw `state` object of version N to version N+1. Steps only add what their
//! version introduced; they never drop keys, so anything still valid survives.
//! The upgraded object is then decoded leniently into [`PersistedProgress`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MigrationError;
use crate::snapshot::{PersistedProgress, ProgressionSnapshot};
use crate::storage::ProgressStorage;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// One schema upgrade step.
#[derive(Clone, Copy)]
pub struct Migration {
    /// Version the step reads.
    pub from: u32,
    /// Version the step produces.
    pub to: u32,
    apply: fn(Map<String, Value>) -> Result<Map<String, Value>, MigrationError>,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

/// Every migration step, oldest first.
pub const MIGRATIONS: &[Migration] = &[Migration {
    from: 1,
    to: 2,
    apply: migrate_v1_to_v2,
}];

/// v2 introduced per-id tracking of opened systems nodes.
pub fn migrate_v1_to_v2(mut state: Map<String, Value>) -> Result<Map<String, Value>, MigrationError> {
    state.insert("systemsOpenedNodeIds".to_string(), Value::Object(Map::new()));
    Ok(state)
}

/// Apply every step needed to bring `state` from `version` to current.
///
/// Records newer than this build are passed through untouched; unknown keys
/// are ignored on decode, so a newer record still loads.
///
/// # Errors
/// - `StepFailed` if a step rejects the state
pub fn upgrade(mut state: Map<String, Value>, version: u32) -> Result<Map<String, Value>, MigrationError> {
    for step in MIGRATIONS.iter().filter(|m| m.to > version) {
        tracing::debug!(from = step.from, to = step.to, "applying progress record migration");
        state = (step.apply)(state).map_err(|e| match e {
            MigrationError::StepFailed { .. } => e,
            other => MigrationError::StepFailed {
                from: step.from,
                to: step.to,
                reason: other.to_string(),
            },
        })?;
    }
    Ok(state)
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    state: Value,
    // Records written before versioning default to 0 and run every step.
    #[serde(default)]
    version: u32,
    #[serde(default, rename = "savedAt")]
    saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct RecordOut<'a> {
    state: &'a PersistedProgress,
    version: u32,
    #[serde(rename = "savedAt")]
    saved_at: DateTime<Utc>,
}

/// A decoded, upgraded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    /// The projection, at the current schema.
    pub progress: PersistedProgress,
    /// Version the record was stored at.
    pub version: u32,
    /// When the record was written. Records from older builds carry none.
    pub saved_at: Option<DateTime<Utc>>,
}

/// Decode a persisted payload, upgrading it to the current schema.
///
/// # Errors
/// - `MalformedRecord` if the payload is not an envelope with an object `state`
/// - `StepFailed` if a migration step fails
/// - `Decode` if a known key holds a value of the wrong type
pub fn decode_record(payload: &str) -> Result<DecodedRecord, MigrationError> {
    let raw: RawRecord = serde_json::from_str(payload).map_err(|e| MigrationError::MalformedRecord {
        reason: e.to_string(),
    })?;

    let Value::Object(state) = raw.state else {
        return Err(MigrationError::MalformedRecord {
            reason: "state is not an object".to_string(),
        });
    };

    let state = upgrade(state, raw.version)?;
    let progress = serde_json::from_value(Value::Object(state))?;
    Ok(DecodedRecord {
        progress,
        version: raw.version,
        saved_at: raw.saved_at,
    })
}

/// Serialize the persisted projection of `snapshot` at the current version.
///
/// # Errors
/// - `Decode` if serialization fails (not expected for well-formed snapshots)
pub fn encode_record(snapshot: &ProgressionSnapshot) -> Result<String, MigrationError> {
    let state = PersistedProgress::from(snapshot);
    Ok(serde_json::to_string(&RecordOut {
        state: &state,
        version: CURRENT_SCHEMA_VERSION,
        saved_at: Utc::now(),
    })?)
}

/// Where a loaded snapshot came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Nothing was stored; defaults were used.
    Fresh,
    /// A record was restored (and upgraded if `from_version` is older).
    Restored {
        /// Version the record was stored at.
        from_version: u32,
        /// When the record was written, if it says.
        saved_at: Option<DateTime<Utc>>,
    },
    /// Stored data could not be used; defaults were used instead.
    Recovered {
        /// Why the stored data was discarded.
        reason: String,
    },
}

/// Result of [`load_snapshot`].
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// The snapshot to start from.
    pub snapshot: ProgressionSnapshot,
    /// How it was obtained.
    pub source: LoadSource,
}

impl LoadOutcome {
    fn fresh() -> Self {
        Self {
            snapshot: ProgressionSnapshot::default(),
            source: LoadSource::Fresh,
        }
    }

    fn recovered(reason: String) -> Self {
        Self {
            snapshot: ProgressionSnapshot::default(),
            source: LoadSource::Recovered { reason },
        }
    }
}

/// Load the snapshot from `storage`, never failing.
///
/// Missing data yields defaults; unreadable, corrupt or malformed data is
/// logged and also yields defaults.
#[must_use]
pub fn load_snapshot(storage: &dyn ProgressStorage, target_xp: u64) -> LoadOutcome {
    let payload = match storage.load() {
        Ok(Some(payload)) => payload,
        Ok(None) => return LoadOutcome::fresh(),
        Err(e) => {
            tracing::warn!(error = %e, "could not read persisted progress; starting fresh");
            return LoadOutcome::recovered(e.to_string());
        }
    };

    match decode_record(&payload) {
        Ok(record) => {
            if record.version < CURRENT_SCHEMA_VERSION {
                tracing::debug!(
                    from_version = record.version,
                    to_version = CURRENT_SCHEMA_VERSION,
                    "upgraded persisted progress"
                );
            }
            LoadOutcome {
                snapshot: ProgressionSnapshot::from_persisted(record.progress, target_xp),
                source: LoadSource::Restored {
                    from_version: record.version,
                    saved_at: record.saved_at,
                },
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed persisted progress");
            LoadOutcome::recovered(e.to_string())
        }
    }
}
