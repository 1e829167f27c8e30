//! The progression snapshot and its persisted projection.
//!
//! [`ProgressionSnapshot`] is the in-memory state the UI reads. Only the store
//! mutates it; callers get read accessors. [`PersistedProgress`] is the subset
//! written to durable storage, keyed exactly as the site has always stored it
//! (camelCase keys, id sets as `{"id": true}` objects).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::{CardId, StarId};
use crate::module::{ModuleFlags, ModuleId};
use crate::progress::{
    FieldOpsProgress, LabProgress, LoyaltyProgress, ModuleProgress, OriginProgress, ProjectsProgress,
    SignalProgress, SystemsProgress,
};
use crate::unlocks::{derive_unlocks, UnlockState};

/// Complete progression state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionSnapshot {
    pub(crate) xp: u64,
    pub(crate) unlocks: UnlockState,
    pub(crate) operator_mode_enabled: bool,
    pub(crate) opened_modules: ModuleFlags,
    pub(crate) completed_modules: ModuleFlags,
    pub(crate) progress: ModuleProgress,
    pub(crate) easter_eggs_found: BTreeSet<String>,
    pub(crate) tpm_simulator_completed: bool,
}

impl ProgressionSnapshot {
    /// Cumulative XP.
    #[must_use]
    pub const fn xp(&self) -> u64 {
        self.xp
    }

    /// 0-100 understanding percentage.
    #[must_use]
    pub const fn system_understanding(&self) -> u8 {
        self.unlocks.system_understanding
    }

    /// Whether Operator Mode can be toggled.
    #[must_use]
    pub const fn operator_unlocked(&self) -> bool {
        self.unlocks.operator_unlocked
    }

    /// Whether the Executive Brief panel is visible.
    #[must_use]
    pub const fn executive_brief_unlocked(&self) -> bool {
        self.unlocks.executive_brief_unlocked
    }

    /// All derived unlock fields at once.
    #[must_use]
    pub const fn unlocks(&self) -> UnlockState {
        self.unlocks
    }

    /// The user's Operator Mode display preference.
    #[must_use]
    pub const fn operator_mode_enabled(&self) -> bool {
        self.operator_mode_enabled
    }

    /// Modules opened at least once.
    #[must_use]
    pub const fn opened_modules(&self) -> &ModuleFlags {
        &self.opened_modules
    }

    /// Modules whose completion rule has held.
    #[must_use]
    pub const fn completed_modules(&self) -> &ModuleFlags {
        &self.completed_modules
    }

    /// Whether `module` has been opened.
    #[must_use]
    pub const fn is_opened(&self, module: ModuleId) -> bool {
        self.opened_modules.get(module)
    }

    /// Whether `module` has been completed.
    #[must_use]
    pub const fn is_completed(&self, module: ModuleId) -> bool {
        self.completed_modules.get(module)
    }

    /// Number of completed modules.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_modules.count()
    }

    /// Per-module interaction state.
    #[must_use]
    pub const fn progress(&self) -> &ModuleProgress {
        &self.progress
    }

    /// Distinct easter egg ids found.
    #[must_use]
    pub const fn easter_eggs_found(&self) -> &BTreeSet<String> {
        &self.easter_eggs_found
    }

    /// Whether the TPM simulator has been completed.
    #[must_use]
    pub const fn tpm_simulator_completed(&self) -> bool {
        self.tpm_simulator_completed
    }

    /// Rebuild a snapshot from its persisted projection.
    ///
    /// Derived fields are recomputed from `xp` rather than trusted, Operator
    /// Mode is cleared if the recomputed state is locked, and the capped
    /// systems-node counter is re-derived from the id set.
    #[must_use]
    pub fn from_persisted(persisted: PersistedProgress, target_xp: u64) -> Self {
        let unlocks = derive_unlocks(persisted.xp, target_xp);

        let mut systems = SystemsProgress {
            nodes_opened: u8::try_from(persisted.systems_nodes_opened).unwrap_or(u8::MAX),
            opened_node_ids: persisted.systems_opened_node_ids,
        };
        systems.recount();

        Self {
            xp: persisted.xp,
            unlocks,
            operator_mode_enabled: persisted.operator_mode_enabled && unlocks.operator_unlocked,
            opened_modules: persisted.opened_modules,
            completed_modules: persisted.completed_modules,
            progress: ModuleProgress {
                systems,
                projects: ProjectsProgress {
                    viewed: persisted.projects_viewed,
                    view_mode_toggled: persisted.projects_view_mode_toggled,
                },
                field_ops: FieldOpsProgress {
                    simulator_run: persisted.field_ops_simulator_run,
                    decision_viewed: persisted.field_ops_decision_viewed,
                },
                lab: LabProgress {
                    experiments_opened: persisted.lab_experiments_opened,
                },
                signal: SignalProgress {
                    tone_switched: persisted.signal_tone_switched,
                },
                loyalty: LoyaltyProgress {
                    cards_flipped: persisted.loyalty_cards_flipped,
                },
                origin: OriginProgress {
                    stars_hovered: persisted.origin_stars_hovered,
                },
            },
            easter_eggs_found: persisted.easter_eggs_found,
            tpm_simulator_completed: persisted.tpm_simulator_completed,
        }
    }
}

/// The persisted subset of a snapshot.
///
/// Every key is optional on input: a missing key takes its default and keys we
/// do not know are ignored, so older and newer records both load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct PersistedProgress {
    pub xp: u64,
    pub system_understanding: u8,
    pub operator_unlocked: bool,
    pub executive_brief_unlocked: bool,
    pub operator_mode_enabled: bool,
    pub opened_modules: ModuleFlags,
    pub completed_modules: ModuleFlags,
    pub systems_nodes_opened: u64,
    #[serde(with = "id_set")]
    pub systems_opened_node_ids: BTreeSet<String>,
    #[serde(with = "id_set")]
    pub projects_viewed: BTreeSet<String>,
    pub projects_view_mode_toggled: bool,
    pub field_ops_simulator_run: bool,
    pub field_ops_decision_viewed: bool,
    #[serde(with = "id_set")]
    pub lab_experiments_opened: BTreeSet<String>,
    pub signal_tone_switched: bool,
    #[serde(with = "id_set")]
    pub loyalty_cards_flipped: BTreeSet<CardId>,
    #[serde(with = "id_set")]
    pub origin_stars_hovered: BTreeSet<StarId>,
    #[serde(with = "id_set")]
    pub easter_eggs_found: BTreeSet<String>,
    pub tpm_simulator_completed: bool,
}

impl From<&ProgressionSnapshot> for PersistedProgress {
    fn from(s: &ProgressionSnapshot) -> Self {
        let p = &s.progress;
        Self {
            xp: s.xp,
            system_understanding: s.unlocks.system_understanding,
            operator_unlocked: s.unlocks.operator_unlocked,
            executive_brief_unlocked: s.unlocks.executive_brief_unlocked,
            operator_mode_enabled: s.operator_mode_enabled,
            opened_modules: s.opened_modules,
            completed_modules: s.completed_modules,
            systems_nodes_opened: u64::from(p.systems.nodes_opened),
            systems_opened_node_ids: p.systems.opened_node_ids.clone(),
            projects_viewed: p.projects.viewed.clone(),
            projects_view_mode_toggled: p.projects.view_mode_toggled,
            field_ops_simulator_run: p.field_ops.simulator_run,
            field_ops_decision_viewed: p.field_ops.decision_viewed,
            lab_experiments_opened: p.lab.experiments_opened.clone(),
            signal_tone_switched: p.signal.tone_switched,
            loyalty_cards_flipped: p.loyalty.cards_flipped.clone(),
            origin_stars_hovered: p.origin.stars_hovered.clone(),
            easter_eggs_found: s.easter_eggs_found.clone(),
            tpm_simulator_completed: s.tpm_simulator_completed,
        }
    }
}

/// Id sets stored as `{"id": true, ...}` objects; `false` entries are dropped on read.
mod id_set {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::de::{Deserialize, DeserializeOwned, Deserializer};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    pub fn serialize<S, T>(set: &BTreeSet<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(set.len()))?;
        for id in set {
            map.serialize_entry(id, &true)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeSet<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Ord,
    {
        let raw = BTreeMap::<T, bool>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(id, seen)| seen.then_some(id))
            .collect())
    }
}
