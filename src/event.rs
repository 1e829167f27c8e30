//! Progression events and their outcomes.
//!
//! Every mutation of the store is one of these events. Hosts can call the
//! named store methods directly, or queue and replay `ProgressEvent`s (they
//! serialize as tagged JSON) through [`crate::ProgressionStore::apply`].

use serde::{Deserialize, Serialize};

use crate::ids::{CardId, StarId};
use crate::module::ModuleId;

/// A tracked user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A module was opened.
    OpenModule {
        /// Module opened.
        module: ModuleId,
    },
    /// A hidden signal was found.
    DiscoverEasterEgg {
        /// Egg id.
        egg_id: String,
    },
    /// The TPM simulator was completed.
    CompleteTpmSimulator,
    /// A systems node was opened. `None` counts as a new anonymous node.
    SystemsOpenNode {
        /// Node id, if the caller has one.
        #[serde(default)]
        node_id: Option<String>,
    },
    /// A project case study was viewed.
    ProjectsViewProject {
        /// Project id.
        project_id: String,
    },
    /// The PM/Engineering view toggle was flipped.
    ProjectsFlipViewToggle,
    /// The ranking simulator was submitted.
    FieldOpsRunSimulator,
    /// The decision explanation was revealed.
    FieldOpsViewDecisionExplanation,
    /// An experiment was opened.
    LabOpenExperiment {
        /// Experiment id.
        experiment_id: String,
    },
    /// The signal tone was switched.
    SignalSwitchTone,
    /// A loyalty card was flipped.
    LoyaltyFlipCard {
        /// Card flipped.
        card: CardId,
    },
    /// An origin star was hovered or focused.
    OriginHoverStar {
        /// Star hovered.
        star: StarId,
    },
    /// Operator Mode was toggled.
    ToggleOperatorMode,
}

impl ProgressEvent {
    /// The module whose interaction state this event touches, if any.
    #[must_use]
    pub const fn owning_module(&self) -> Option<ModuleId> {
        match self {
            Self::SystemsOpenNode { .. } => Some(ModuleId::Systems),
            Self::ProjectsViewProject { .. } | Self::ProjectsFlipViewToggle => Some(ModuleId::Projects),
            Self::FieldOpsRunSimulator | Self::FieldOpsViewDecisionExplanation => Some(ModuleId::FieldOps),
            Self::LabOpenExperiment { .. } => Some(ModuleId::Lab),
            Self::SignalSwitchTone => Some(ModuleId::Signal),
            Self::LoyaltyFlipCard { .. } => Some(ModuleId::Loyalty),
            Self::OriginHoverStar { .. } => Some(ModuleId::Origin),
            Self::OpenModule { .. }
            | Self::DiscoverEasterEgg { .. }
            | Self::CompleteTpmSimulator
            | Self::ToggleOperatorMode => None,
        }
    }
}

/// What applying an event did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// Whether any state changed (and was therefore persisted).
    pub changed: bool,
    /// XP awarded by this event, including any completion bonus.
    pub xp_awarded: u64,
    /// Module completed by this event.
    pub completed: Option<ModuleId>,
    /// Operator Mode became available with this event.
    pub operator_unlocked_now: bool,
}

impl EventOutcome {
    /// An event that changed nothing.
    #[must_use]
    pub const fn unchanged() -> Self {
        Self {
            changed: false,
            xp_awarded: 0,
            completed: None,
            operator_unlocked_now: false,
        }
    }
}
