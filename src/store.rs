//! The progression store.
//!
//! `ProgressionStore` owns the snapshot and is the only thing that mutates it.
//! Every event runs to completion inside one `&mut self` call:
//!
//! ```text
//! event ─▶ update module state ─▶ completion rule ─▶ award XP ─▶ derive unlocks
//!                                                                    │
//!                     listeners ◀── persist projection ◀─────────────┘
//! ```
//!
//! None of the event methods can fail. Persistence errors are logged and
//! counted; the in-memory snapshot stays authoritative for the session and the
//! next state change writes the full projection again.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::completion;
use crate::config::ProgressionConfig;
use crate::error::XpResult;
use crate::event::{EventOutcome, ProgressEvent};
use crate::ids::{anonymous_node_id, CardId, StarId};
use crate::migration::{encode_record, load_snapshot, LoadSource};
use crate::module::ModuleId;
use crate::snapshot::ProgressionSnapshot;
use crate::storage::{InMemoryStorage, ProgressStorage};
#[cfg(feature = "persistent")]
use crate::storage::{open_file_storage, PersistentConfig};
use crate::unlocks::{derive_unlocks, unlock_threshold_xp};

/// Handle returned by [`ProgressionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked after every state-changing event.
pub type Listener = Box<dyn FnMut(&ProgressionSnapshot, &EventOutcome) + Send>;

/// XP/progression state machine.
pub struct ProgressionStore {
    config: ProgressionConfig,
    storage: Arc<dyn ProgressStorage>,
    snapshot: ProgressionSnapshot,
    load_source: LoadSource,
    listeners: Vec<(SubscriptionId, Listener)>,
    persist_failures: u64,
}

impl fmt::Debug for ProgressionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressionStore")
            .field("config", &self.config)
            .field("snapshot", &self.snapshot)
            .field("load_source", &self.load_source)
            .field("listeners", &self.listeners.len())
            .field("persist_failures", &self.persist_failures)
            .finish_non_exhaustive()
    }
}

impl ProgressionStore {
    /// Load (or initialise) progression state from `storage`.
    ///
    /// `storage` is expected to be bound to `config.record_name` already; use
    /// [`Self::open_in_dir`] to have the store bind the record file itself.
    /// Persisted data that is missing, unreadable or malformed is replaced by
    /// defaults; see [`crate::migration::load_snapshot`].
    ///
    /// # Errors
    /// - If `config` is invalid
    pub fn open(config: ProgressionConfig, storage: Arc<dyn ProgressStorage>) -> XpResult<Self> {
        let config = config.validate()?;
        Ok(Self::from_parts(config, storage))
    }

    /// Open a store over the file `<dir>/<config.record_name>.opxp`.
    ///
    /// # Errors
    /// - If `config` or `storage_config` is invalid
    /// - If `dir` cannot be created
    #[cfg(feature = "persistent")]
    pub fn open_in_dir(
        dir: impl AsRef<std::path::Path>,
        config: ProgressionConfig,
        storage_config: Option<PersistentConfig>,
    ) -> XpResult<Self> {
        let config = config.validate()?;
        let storage = open_file_storage(dir, &config.record_name, storage_config)?;
        Ok(Self::from_parts(config, Arc::new(storage)))
    }

    /// A store with default rules over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_parts(ProgressionConfig::default(), Arc::new(InMemoryStorage::new()))
    }

    fn from_parts(config: ProgressionConfig, storage: Arc<dyn ProgressStorage>) -> Self {
        let loaded = load_snapshot(storage.as_ref(), config.understanding_target_xp);
        tracing::debug!(
            record = %config.record_name,
            source = ?loaded.source,
            xp = loaded.snapshot.xp(),
            "progression store opened"
        );
        Self {
            config,
            storage,
            snapshot: loaded.snapshot,
            load_source: loaded.source,
            listeners: Vec::new(),
            persist_failures: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn snapshot(&self) -> &ProgressionSnapshot {
        &self.snapshot
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// How the starting snapshot was obtained.
    #[must_use]
    pub const fn load_source(&self) -> &LoadSource {
        &self.load_source
    }

    /// Storage writes that failed and were swallowed.
    #[must_use]
    pub const fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    /// XP still needed before Operator Mode unlocks; 0 once unlocked.
    #[must_use]
    pub fn xp_to_unlock(&self) -> u64 {
        unlock_threshold_xp(self.config.understanding_target_xp).saturating_sub(self.snapshot.xp)
    }

    /// Register a listener called after every state-changing event.
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener. Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Apply one event.
    pub fn apply(&mut self, event: ProgressEvent) -> EventOutcome {
        let xp_before = self.snapshot.xp;
        let was_unlocked = self.snapshot.unlocks.operator_unlocked;
        let owning_module = event.owning_module();
        let rules = self.config.rules;

        let s = &mut self.snapshot;
        let p = &mut s.progress;
        let mut changed = match event {
            ProgressEvent::OpenModule { module } => {
                let first = s.opened_modules.raise(module);
                if first {
                    award(&mut s.xp, rules.first_module_open);
                }
                first
            }
            ProgressEvent::DiscoverEasterEgg { egg_id } => {
                let first = s.easter_eggs_found.insert(egg_id);
                if first {
                    award(&mut s.xp, rules.easter_egg);
                }
                first
            }
            ProgressEvent::CompleteTpmSimulator => {
                let first = !s.tpm_simulator_completed;
                if first {
                    s.tpm_simulator_completed = true;
                    award(&mut s.xp, rules.tpm_simulator);
                }
                first
            }
            ProgressEvent::SystemsOpenNode { node_id } => {
                p.systems.open_node(node_id.unwrap_or_else(anonymous_node_id))
            }
            ProgressEvent::ProjectsViewProject { project_id } => p.projects.view(project_id),
            ProgressEvent::ProjectsFlipViewToggle => p.projects.flip_view_toggle(),
            ProgressEvent::FieldOpsRunSimulator => p.field_ops.run_simulator(),
            ProgressEvent::FieldOpsViewDecisionExplanation => p.field_ops.view_decision(),
            ProgressEvent::LabOpenExperiment { experiment_id } => p.lab.open_experiment(experiment_id),
            ProgressEvent::SignalSwitchTone => p.signal.switch_tone(),
            ProgressEvent::LoyaltyFlipCard { card } => p.loyalty.flip(card),
            ProgressEvent::OriginHoverStar { star } => p.origin.hover(star),
            ProgressEvent::ToggleOperatorMode => {
                if s.unlocks.operator_unlocked {
                    s.operator_mode_enabled = !s.operator_mode_enabled;
                    true
                } else {
                    false
                }
            }
        };

        let completed = owning_module.filter(|m| self.complete_if_satisfied(*m));
        changed |= completed.is_some();

        if !changed {
            return EventOutcome::unchanged();
        }

        self.snapshot.unlocks = derive_unlocks(self.snapshot.xp, self.config.understanding_target_xp);

        let outcome = EventOutcome {
            changed,
            xp_awarded: self.snapshot.xp - xp_before,
            completed,
            operator_unlocked_now: !was_unlocked && self.snapshot.unlocks.operator_unlocked,
        };

        if outcome.xp_awarded > 0 {
            tracing::debug!(
                awarded = outcome.xp_awarded,
                xp = self.snapshot.xp,
                understanding = self.snapshot.unlocks.system_understanding,
                "xp awarded"
            );
        }
        if outcome.operator_unlocked_now {
            tracing::debug!(xp = self.snapshot.xp, "operator mode unlocked");
        }

        self.persist();
        self.notify(&outcome);
        outcome
    }

    /// Mark `module` completed if its rule holds and it is not yet completed.
    fn complete_if_satisfied(&mut self, module: ModuleId) -> bool {
        if self.snapshot.completed_modules.get(module)
            || !completion::is_satisfied(module, &self.snapshot.progress)
        {
            return false;
        }
        self.snapshot.completed_modules.raise(module);
        award(&mut self.snapshot.xp, self.config.rules.module_complete);
        tracing::debug!(
            %module,
            rule = completion::rule_for(module).description,
            "module completed"
        );
        true
    }

    fn persist(&mut self) {
        let (reason, transient) = match encode_record(&self.snapshot) {
            Ok(payload) => match self.storage.save(&payload) {
                Ok(()) => return,
                Err(e) => (e.to_string(), e.is_transient()),
            },
            Err(e) => (e.to_string(), false),
        };

        self.persist_failures += 1;
        tracing::warn!(
            record = %self.config.record_name,
            error = %reason,
            transient,
            "failed to persist progression; keeping in-memory state"
        );
    }

    fn notify(&mut self, outcome: &EventOutcome) {
        for (_, listener) in &mut self.listeners {
            listener(&self.snapshot, outcome);
        }
    }

    /// Mark `module` opened; awards first-open XP once.
    pub fn open_module(&mut self, module: ModuleId) -> EventOutcome {
        self.apply(ProgressEvent::OpenModule { module })
    }

    /// [`Self::open_module`] for a string id. Unknown ids are logged and ignored.
    pub fn open_module_named(&mut self, module: &str) -> EventOutcome {
        match module.parse::<ModuleId>() {
            Ok(module) => self.open_module(module),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring open of unknown module");
                EventOutcome::unchanged()
            }
        }
    }

    /// Record a hidden signal; awards XP once per distinct id.
    pub fn discover_easter_egg(&mut self, egg_id: impl Into<String>) -> EventOutcome {
        self.apply(ProgressEvent::DiscoverEasterEgg { egg_id: egg_id.into() })
    }

    /// One-shot TPM simulator completion.
    pub fn complete_tpm_simulator(&mut self) -> EventOutcome {
        self.apply(ProgressEvent::CompleteTpmSimulator)
    }

    /// Record a systems node as opened. Without an id, counts one new node.
    pub fn systems_open_node(&mut self, node_id: Option<&str>) -> EventOutcome {
        self.apply(ProgressEvent::SystemsOpenNode {
            node_id: node_id.map(str::to_string),
        })
    }

    /// Record a project view.
    pub fn projects_view_project(&mut self, project_id: impl Into<String>) -> EventOutcome {
        self.apply(ProgressEvent::ProjectsViewProject {
            project_id: project_id.into(),
        })
    }

    /// Record a flip of the PM/Engineering view toggle.
    pub fn projects_flip_view_toggle(&mut self) -> EventOutcome {
        self.apply(ProgressEvent::ProjectsFlipViewToggle)
    }

    /// Record a ranking simulator submission.
    pub fn field_ops_run_simulator(&mut self) -> EventOutcome {
        self.apply(ProgressEvent::FieldOpsRunSimulator)
    }

    /// Record the decision explanation being revealed.
    pub fn field_ops_view_decision_explanation(&mut self) -> EventOutcome {
        self.apply(ProgressEvent::FieldOpsViewDecisionExplanation)
    }

    /// Record an experiment being opened.
    pub fn lab_open_experiment(&mut self, experiment_id: impl Into<String>) -> EventOutcome {
        self.apply(ProgressEvent::LabOpenExperiment {
            experiment_id: experiment_id.into(),
        })
    }

    /// Record a signal tone switch.
    pub fn signal_switch_tone(&mut self) -> EventOutcome {
        self.apply(ProgressEvent::SignalSwitchTone)
    }

    /// Record a loyalty card flip.
    pub fn loyalty_flip_card(&mut self, card: impl Into<CardId>) -> EventOutcome {
        self.apply(ProgressEvent::LoyaltyFlipCard { card: card.into() })
    }

    /// Record an origin star being hovered or focused.
    pub fn origin_hover_star(&mut self, star: impl Into<StarId>) -> EventOutcome {
        self.apply(ProgressEvent::OriginHoverStar { star: star.into() })
    }

    /// Flip Operator Mode. No effect until it is unlocked.
    pub fn toggle_operator_mode(&mut self) -> EventOutcome {
        self.apply(ProgressEvent::ToggleOperatorMode)
    }
}

fn award(xp: &mut u64, amount: u64) {
    *xp = xp.saturating_add(amount);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn store_with(storage: &Arc<InMemoryStorage>) -> ProgressionStore {
        let port: Arc<dyn ProgressStorage> = storage.clone();
        ProgressionStore::open(ProgressionConfig::default(), port).unwrap()
    }

    #[test]
    fn open_signal_awards_first_open_xp() {
        let mut store = ProgressionStore::in_memory();
        let outcome = store.open_module(ModuleId::Signal);

        assert_eq!(outcome.xp_awarded, 10);
        assert_eq!(store.snapshot().xp(), 10);
        assert!(store.snapshot().is_opened(ModuleId::Signal));
        assert_eq!(store.snapshot().system_understanding(), 3);
    }

    #[test]
    fn second_open_is_a_noop() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut store = store_with(&storage);
        store.open_module(ModuleId::Systems);
        let writes = storage.write_count();

        let outcome = store.open_module(ModuleId::Systems);
        assert_eq!(outcome, EventOutcome::unchanged());
        assert_eq!(store.snapshot().xp(), 10);
        assert_eq!(storage.write_count(), writes);
    }

    #[test]
    fn tone_switch_completes_signal() {
        let mut store = ProgressionStore::in_memory();
        store.open_module(ModuleId::Signal);
        let outcome = store.signal_switch_tone();

        assert_eq!(outcome.completed, Some(ModuleId::Signal));
        assert_eq!(outcome.xp_awarded, 40);
        assert!(store.snapshot().is_completed(ModuleId::Signal));
        assert_eq!(store.snapshot().xp(), 50);

        let again = store.signal_switch_tone();
        assert!(!again.changed);
        assert_eq!(store.snapshot().xp(), 50);
    }

    #[test]
    fn repeated_card_flip_awards_nothing() {
        let mut store = ProgressionStore::in_memory();
        store.loyalty_flip_card("giants");
        let outcome = store.loyalty_flip_card("giants");

        assert!(!outcome.changed);
        assert_eq!(store.snapshot().progress().loyalty.cards_flipped.len(), 1);
        assert!(!store.snapshot().is_completed(ModuleId::Loyalty));
        assert_eq!(store.snapshot().xp(), 0);

        let outcome = store.loyalty_flip_card(CardId::Niners);
        assert_eq!(outcome.completed, Some(ModuleId::Loyalty));
        assert_eq!(store.snapshot().xp(), 40);
    }

    #[test]
    fn card_and_star_ids_are_recorded_verbatim() {
        let mut store = ProgressionStore::in_memory();
        store.loyalty_flip_card("Giants");
        store.loyalty_flip_card("niners");
        assert!(!store.snapshot().is_completed(ModuleId::Loyalty));
        assert!(store
            .snapshot()
            .progress()
            .loyalty
            .cards_flipped
            .contains(&CardId::Other("Giants".to_string())));

        store.origin_hover_star(" Poet ");
        assert!(store
            .snapshot()
            .progress()
            .origin
            .stars_hovered
            .contains(&StarId::Other(" Poet ".to_string())));
    }

    #[test]
    fn fourth_star_completes_origin_once() {
        let mut store = ProgressionStore::in_memory();
        let stars = ["husband", "dad", "builder", "systems-thinker"];
        let outcomes: Vec<_> = stars.iter().map(|s| store.origin_hover_star(*s)).collect();

        assert!(outcomes[..3].iter().all(|o| o.completed.is_none()));
        assert_eq!(outcomes[3].completed, Some(ModuleId::Origin));
        assert_eq!(store.snapshot().xp(), 40);

        let fifth = store.origin_hover_star("musician");
        assert!(fifth.changed);
        assert_eq!(fifth.xp_awarded, 0);
        assert_eq!(store.snapshot().xp(), 40);
    }

    #[test]
    fn anonymous_nodes_count_as_distinct() {
        let mut store = ProgressionStore::in_memory();
        store.systems_open_node(None);
        store.systems_open_node(None);
        assert!(!store.snapshot().is_completed(ModuleId::Systems));
        let outcome = store.systems_open_node(None);

        assert_eq!(outcome.completed, Some(ModuleId::Systems));
        assert_eq!(store.snapshot().progress().systems.nodes_opened, 3);
    }

    #[test]
    fn known_node_id_repeat_does_not_count() {
        let mut store = ProgressionStore::in_memory();
        store.systems_open_node(Some("strategy"));
        store.systems_open_node(Some("strategy"));
        store.systems_open_node(Some("ops"));
        assert_eq!(store.snapshot().progress().systems.nodes_opened, 2);
        assert!(!store.snapshot().is_completed(ModuleId::Systems));
    }

    #[test]
    fn field_ops_and_projects_need_both_parts() {
        let mut store = ProgressionStore::in_memory();
        store.field_ops_run_simulator();
        assert!(!store.snapshot().is_completed(ModuleId::FieldOps));
        store.field_ops_view_decision_explanation();
        assert!(store.snapshot().is_completed(ModuleId::FieldOps));

        store.projects_flip_view_toggle();
        store.projects_view_project("atlas");
        assert!(!store.snapshot().is_completed(ModuleId::Projects));
        store.projects_view_project("beacon");
        assert!(store.snapshot().is_completed(ModuleId::Projects));

        store.lab_open_experiment("prompt-router");
        store.lab_open_experiment("prompt-router");
        assert!(!store.snapshot().is_completed(ModuleId::Lab));
        store.lab_open_experiment("eval-harness");
        assert!(store.snapshot().is_completed(ModuleId::Lab));

        assert_eq!(store.snapshot().xp(), 120);
    }

    #[test]
    fn toggle_is_gated_until_unlocked() {
        let mut store = ProgressionStore::in_memory();
        for _ in 0..5 {
            assert!(!store.toggle_operator_mode().changed);
        }
        assert!(!store.snapshot().operator_mode_enabled());

        // 100 + 50 * 4 + 10 * 5 = 350
        store.complete_tpm_simulator();
        for egg in ["konami", "crt", "signal-ghost", "tv-static"] {
            store.discover_easter_egg(egg);
        }
        let mut last = EventOutcome::unchanged();
        for module in [ModuleId::Systems, ModuleId::Projects, ModuleId::FieldOps, ModuleId::Lab, ModuleId::Origin] {
            last = store.open_module(module);
        }

        assert_eq!(store.snapshot().xp(), 350);
        assert_eq!(store.snapshot().system_understanding(), 100);
        assert!(store.snapshot().operator_unlocked());
        assert!(store.snapshot().executive_brief_unlocked());
        assert!(last.operator_unlocked_now);
        assert_eq!(store.xp_to_unlock(), 0);

        assert!(store.toggle_operator_mode().changed);
        assert!(store.snapshot().operator_mode_enabled());
        store.toggle_operator_mode();
        assert!(!store.snapshot().operator_mode_enabled());
    }

    #[test]
    fn unlock_happens_at_349() {
        let mut store = ProgressionStore::in_memory();
        assert_eq!(store.xp_to_unlock(), 349);
        store.complete_tpm_simulator();
        assert_eq!(store.xp_to_unlock(), 249);
    }

    #[test]
    fn tpm_and_eggs_are_one_shot() {
        let mut store = ProgressionStore::in_memory();
        assert_eq!(store.complete_tpm_simulator().xp_awarded, 100);
        assert_eq!(store.complete_tpm_simulator().xp_awarded, 0);
        assert_eq!(store.discover_easter_egg("konami").xp_awarded, 50);
        assert_eq!(store.discover_easter_egg("konami").xp_awarded, 0);
        assert_eq!(store.discover_easter_egg("crt").xp_awarded, 50);
        assert_eq!(store.snapshot().xp(), 200);
        assert!(store.snapshot().tpm_simulator_completed());
    }

    #[test]
    fn unknown_module_name_is_ignored() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut store = store_with(&storage);
        assert!(!store.open_module_named("bridge").changed);
        assert_eq!(storage.write_count(), 0);

        assert_eq!(store.open_module_named("field-ops").xp_awarded, 10);
        assert!(store.snapshot().is_opened(ModuleId::FieldOps));
    }

    #[test]
    fn write_failures_do_not_block_state() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut store = store_with(&storage);
        storage.set_fail_writes(true);

        store.open_module(ModuleId::Lab);
        assert_eq!(store.snapshot().xp(), 10);
        assert_eq!(store.persist_failures(), 1);
        assert!(storage.peek().is_none());

        storage.set_fail_writes(false);
        store.open_module(ModuleId::Signal);
        let reopened = store_with(&storage);
        assert_eq!(reopened.snapshot().xp(), 20);
        assert!(reopened.snapshot().is_opened(ModuleId::Lab));
    }

    #[test]
    fn listeners_see_each_change_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = ProgressionStore::in_memory();

        let sink = Arc::clone(&seen);
        let id = store.subscribe(Box::new(move |snapshot, outcome| {
            sink.lock().unwrap().push((snapshot.xp(), outcome.completed));
        }));

        store.open_module(ModuleId::Signal);
        store.open_module(ModuleId::Signal);
        store.signal_switch_tone();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(10, None), (50, Some(ModuleId::Signal))]
        );

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.open_module(ModuleId::Lab);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ProgressionConfig {
            understanding_target_xp: 0,
            ..ProgressionConfig::default()
        };
        let err = ProgressionStore::open(config, Arc::new(InMemoryStorage::new())).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn state_is_restored_on_reopen() {
        let storage = Arc::new(InMemoryStorage::new());
        {
            let mut store = store_with(&storage);
            store.open_module(ModuleId::Origin);
            store.loyalty_flip_card("giants");
            store.discover_easter_egg("konami");
        }

        let store = store_with(&storage);
        assert!(matches!(
            store.load_source(),
            LoadSource::Restored {
                from_version: 2,
                saved_at: Some(_)
            }
        ));
        assert_eq!(store.snapshot().xp(), 60);
        assert!(store.snapshot().progress().loyalty.cards_flipped.contains(&CardId::Giants));
    }
}
