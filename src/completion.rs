//! Completion rule table.
//!
//! One declarative predicate per module over that module's interaction state.
//! The store evaluates the owning module's rule after every event that touches
//! its state; the first time a rule holds the module is marked completed.

use crate::ids::CardId;
use crate::module::ModuleId;
use crate::progress::ModuleProgress;

/// Distinct systems nodes needed.
pub const SYSTEMS_NODES_REQUIRED: u8 = 3;
/// Distinct projects that must be viewed.
pub const PROJECTS_VIEWED_REQUIRED: usize = 2;
/// Distinct lab experiments that must be opened.
pub const LAB_EXPERIMENTS_REQUIRED: usize = 2;
/// Distinct origin stars that must be hovered.
pub const ORIGIN_STARS_REQUIRED: usize = 4;

/// A module's completion condition.
#[derive(Clone, Copy)]
pub struct CompletionRule {
    /// Module the rule belongs to.
    pub module: ModuleId,
    /// Human readable condition, logged when the module completes.
    pub description: &'static str,
    predicate: fn(&ModuleProgress) -> bool,
}

impl std::fmt::Debug for CompletionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionRule")
            .field("module", &self.module)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl CompletionRule {
    /// Evaluate the rule against `progress`.
    #[must_use]
    pub fn is_satisfied(&self, progress: &ModuleProgress) -> bool {
        (self.predicate)(progress)
    }
}

/// All rules, in [`ModuleId::ALL`] order.
pub const RULES: [CompletionRule; 7] = [
    CompletionRule {
        module: ModuleId::Systems,
        description: "open at least 3 distinct systems nodes",
        predicate: |p| p.systems.nodes_opened >= SYSTEMS_NODES_REQUIRED,
    },
    CompletionRule {
        module: ModuleId::Projects,
        description: "view at least 2 projects and flip the PM/Engineering toggle",
        predicate: |p| p.projects.viewed.len() >= PROJECTS_VIEWED_REQUIRED && p.projects.view_mode_toggled,
    },
    CompletionRule {
        module: ModuleId::FieldOps,
        description: "submit the ranking simulator and reveal the decision explanation",
        predicate: |p| p.field_ops.simulator_run && p.field_ops.decision_viewed,
    },
    CompletionRule {
        module: ModuleId::Lab,
        description: "open at least 2 experiments",
        predicate: |p| p.lab.experiments_opened.len() >= LAB_EXPERIMENTS_REQUIRED,
    },
    CompletionRule {
        module: ModuleId::Signal,
        description: "switch the signal tone",
        predicate: |p| p.signal.tone_switched,
    },
    CompletionRule {
        module: ModuleId::Loyalty,
        description: "flip both the giants and niners cards",
        predicate: |p| {
            CardId::REQUIRED
                .iter()
                .all(|card| p.loyalty.cards_flipped.contains(card))
        },
    },
    CompletionRule {
        module: ModuleId::Origin,
        description: "hover at least 4 identity stars",
        predicate: |p| p.origin.stars_hovered.len() >= ORIGIN_STARS_REQUIRED,
    },
];

/// The rule for `module`.
#[must_use]
pub fn rule_for(module: ModuleId) -> &'static CompletionRule {
    // RULES is laid out in ModuleId order; the test below pins that.
    &RULES[module as usize]
}

/// Whether `module`'s completion condition holds.
#[must_use]
pub fn is_satisfied(module: ModuleId, progress: &ModuleProgress) -> bool {
    rule_for(module).is_satisfied(progress)
}
