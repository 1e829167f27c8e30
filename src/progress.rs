//! Per-module interaction state.
//!
//! Each module tracks only the interactions its completion rule looks at.
//! Recording methods return `true` when the state actually changed, which is
//! how the store decides whether anything needs re-evaluating or persisting.

use std::collections::BTreeSet;

use crate::ids::{CardId, StarId};

/// `systemsNodesOpened` never reports more than this many nodes.
pub const NODE_COUNT_CAP: u8 = 3;

/// Systems leadership map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemsProgress {
    /// Distinct node count, capped at [`NODE_COUNT_CAP`].
    pub nodes_opened: u8,
    /// Every distinct node id opened.
    pub opened_node_ids: BTreeSet<String>,
}

impl SystemsProgress {
    /// Record `node_id` as opened.
    pub fn open_node(&mut self, node_id: String) -> bool {
        if !self.opened_node_ids.insert(node_id) {
            return false;
        }
        self.recount();
        true
    }

    /// Re-derive the capped counter from the id set.
    ///
    /// A counter carried over from a schema without node ids is never lowered.
    pub(crate) fn recount(&mut self) {
        let distinct = u8::try_from(self.opened_node_ids.len()).unwrap_or(u8::MAX);
        self.nodes_opened = self.nodes_opened.max(distinct).min(NODE_COUNT_CAP);
    }
}

/// Project case studies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectsProgress {
    /// Distinct project ids viewed.
    pub viewed: BTreeSet<String>,
    /// PM/Engineering view toggle flipped at least once.
    pub view_mode_toggled: bool,
}

impl ProjectsProgress {
    /// Record a project view.
    pub fn view(&mut self, project_id: String) -> bool {
        self.viewed.insert(project_id)
    }

    /// Record a flip of the view toggle.
    pub fn flip_view_toggle(&mut self) -> bool {
        raise(&mut self.view_mode_toggled)
    }
}

/// Field operations ranking simulator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOpsProgress {
    /// Ranking simulator submitted.
    pub simulator_run: bool,
    /// Decision explanation revealed.
    pub decision_viewed: bool,
}

impl FieldOpsProgress {
    /// Record a simulator submission.
    pub fn run_simulator(&mut self) -> bool {
        raise(&mut self.simulator_run)
    }

    /// Record the explanation being revealed.
    pub fn view_decision(&mut self) -> bool {
        raise(&mut self.decision_viewed)
    }
}

/// Experiments workbench.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabProgress {
    /// Distinct experiment ids opened.
    pub experiments_opened: BTreeSet<String>,
}

impl LabProgress {
    /// Record an experiment being opened.
    pub fn open_experiment(&mut self, experiment_id: String) -> bool {
        self.experiments_opened.insert(experiment_id)
    }
}

/// Signal tone panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalProgress {
    /// Tone switched at least once.
    pub tone_switched: bool,
}

impl SignalProgress {
    /// Record a tone switch.
    pub fn switch_tone(&mut self) -> bool {
        raise(&mut self.tone_switched)
    }
}

/// Loyalty cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoyaltyProgress {
    /// Distinct cards flipped.
    pub cards_flipped: BTreeSet<CardId>,
}

impl LoyaltyProgress {
    /// Record a card flip.
    pub fn flip(&mut self, card: CardId) -> bool {
        self.cards_flipped.insert(card)
    }
}

/// Origin constellation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginProgress {
    /// Distinct stars hovered or focused.
    pub stars_hovered: BTreeSet<StarId>,
}

impl OriginProgress {
    /// Record a star being hovered or focused.
    pub fn hover(&mut self, star: StarId) -> bool {
        self.stars_hovered.insert(star)
    }
}

/// Interaction state for all seven modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleProgress {
    #[allow(missing_docs)]
    pub systems: SystemsProgress,
    #[allow(missing_docs)]
    pub projects: ProjectsProgress,
    #[allow(missing_docs)]
    pub field_ops: FieldOpsProgress,
    #[allow(missing_docs)]
    pub lab: LabProgress,
    #[allow(missing_docs)]
    pub signal: SignalProgress,
    #[allow(missing_docs)]
    pub loyalty: LoyaltyProgress,
    #[allow(missing_docs)]
    pub origin: OriginProgress,
}

fn raise(flag: &mut bool) -> bool {
    let changed = !*flag;
    *flag = true;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_count_is_distinct_and_capped() {
        let mut systems = SystemsProgress::default();
        assert!(systems.open_node("strategy".into()));
        assert!(!systems.open_node("strategy".into()));
        assert_eq!(systems.nodes_opened, 1);

        for id in ["ops", "ai-enablement", "talent-development", "executive-communication"] {
            systems.open_node(id.into());
        }
        assert_eq!(systems.opened_node_ids.len(), 5);
        assert_eq!(systems.nodes_opened, NODE_COUNT_CAP);
    }

    #[test]
    fn legacy_counter_is_not_lowered() {
        let mut systems = SystemsProgress {
            nodes_opened: 2,
            opened_node_ids: BTreeSet::new(),
        };
        systems.recount();
        assert_eq!(systems.nodes_opened, 2);

        systems.open_node("strategy".into());
        assert_eq!(systems.nodes_opened, 2);
        systems.open_node("ops".into());
        systems.open_node("hiring".into());
        assert_eq!(systems.nodes_opened, 3);
    }

    #[test]
    fn one_way_flags_report_only_first_change() {
        let mut field_ops = FieldOpsProgress::default();
        assert!(field_ops.run_simulator());
        assert!(!field_ops.run_simulator());
        assert!(field_ops.view_decision());

        let mut signal = SignalProgress::default();
        assert!(signal.switch_tone());
        assert!(!signal.switch_tone());
    }

    #[test]
    fn repeated_card_flip_is_not_a_change() {
        let mut loyalty = LoyaltyProgress::default();
        assert!(loyalty.flip(CardId::Giants));
        assert!(!loyalty.flip(CardId::from("giants")));
        assert_eq!(loyalty.cards_flipped.len(), 1);
    }
}
