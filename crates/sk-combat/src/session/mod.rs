//! The combat state machine.
//!
//! A [`CombatSession`] owns the roster, the round counter, and the pointer
//! into the active turn order. Every operation is total: unknown ids and
//! unmet preconditions leave the state untouched instead of failing.

pub mod damage;
pub mod log;
pub mod summary;

pub use damage::CombatantPatch;
pub use log::{CombatEvent, CombatLog, EventKind};
pub use summary::CombatSummary;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combatant::status::tick_death_saves;
use crate::combatant::{CharacterRecord, Combatant, CombatantId, NewCombatant};
use crate::config::TrackerConfig;
use crate::turn_order;

/// The part of a session that is shared between room participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedState {
    /// Full roster in insertion order.
    pub combatants: Vec<Combatant>,
    /// Index into the active (non-deceased, initiative-sorted) order.
    pub current_turn_index: usize,
    /// Whether combat has started.
    pub started: bool,
    /// Current round, starting at 1.
    pub round: u32,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            combatants: Vec::new(),
            current_turn_index: 0,
            started: false,
            round: 1,
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatPhase {
    /// Not started (or reset/cleared).
    Idle,
    /// Started, turns are being taken.
    Active,
    /// The end-of-combat report is showing. Mutations are still allowed.
    Reporting,
}

/// What a turn advance did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// True if the turn wrapped around into a new round.
    pub new_round: bool,
    /// The round after the advance.
    pub round: u32,
    /// Combatants who ran out of death saves during this advance.
    pub deaths: Vec<CombatantId>,
}

/// A combat encounter.
#[derive(Debug, Clone)]
pub struct CombatSession {
    config: TrackerConfig,
    state: SharedState,
    reporting: bool,
    log: CombatLog,
}

impl CombatSession {
    /// Create an idle session with an empty roster.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: SharedState::default(),
            reporting: false,
            log: CombatLog::new(),
        }
    }

    /// The configuration this session was created with.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The synchronisable state.
    pub fn shared_state(&self) -> &SharedState {
        &self.state
    }

    /// Replace the synchronisable state wholesale, keeping the local log and
    /// report flag.
    pub fn replace_shared_state(&mut self, state: SharedState) {
        self.state = state;
    }

    /// The local combat log.
    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    /// The full roster in insertion order.
    pub fn combatants(&self) -> &[Combatant] {
        &self.state.combatants
    }

    /// Look up a combatant by id.
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.state.combatants.iter().find(|c| c.id == id)
    }

    /// Look up a combatant by name (case-insensitive, first match).
    pub fn find_by_name(&self, name: &str) -> Option<&Combatant> {
        self.state
            .combatants
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// The roster sorted by initiative, deceased included.
    pub fn sorted_combatants(&self) -> Vec<&Combatant> {
        turn_order::sorted_combatants(&self.state.combatants)
    }

    /// The combatants who take turns, in order.
    pub fn active_combatants(&self) -> Vec<&Combatant> {
        turn_order::active_combatants(&self.state.combatants)
    }

    /// Whose turn it is, if combat has anyone to act.
    pub fn current_combatant(&self) -> Option<&Combatant> {
        self.active_combatants()
            .get(self.state.current_turn_index)
            .copied()
    }

    /// Index into the active order.
    pub fn current_turn_index(&self) -> usize {
        self.state.current_turn_index
    }

    /// Current round number.
    pub fn round(&self) -> u32 {
        self.state.round
    }

    /// Whether combat has started.
    pub fn is_started(&self) -> bool {
        self.state.started
    }

    /// The lifecycle phase.
    pub fn phase(&self) -> CombatPhase {
        if self.reporting {
            CombatPhase::Reporting
        } else if self.state.started {
            CombatPhase::Active
        } else {
            CombatPhase::Idle
        }
    }

    /// Add a combatant to the roster and return their id.
    pub fn add_combatant(&mut self, attrs: NewCombatant) -> CombatantId {
        let combatant = Combatant::create(attrs, &self.config);
        let id = combatant.id;
        debug!(%id, name = %combatant.name, initiative = combatant.initiative, "combatant added");
        self.log.record(
            self.state.round,
            EventKind::Added {
                name: combatant.name.clone(),
            },
        );
        self.state.combatants.push(combatant);
        id
    }

    /// Add a saved character as a player combatant.
    pub fn add_character(&mut self, record: &CharacterRecord) -> CombatantId {
        self.add_combatant(NewCombatant::from(record))
    }

    /// Remove a combatant, keeping the turn pointer on the same combatant.
    ///
    /// If the removed combatant acted before the current one this round,
    /// the pointer moves back by one.
    pub fn remove_combatant(&mut self, id: CombatantId) -> Option<Combatant> {
        let active_index = turn_order::active_position(&self.state.combatants, id);
        let roster_index = self.state.combatants.iter().position(|c| c.id == id)?;

        if active_index.is_some_and(|pos| pos < self.state.current_turn_index) {
            self.state.current_turn_index = self.state.current_turn_index.saturating_sub(1);
        }

        let removed = self.state.combatants.remove(roster_index);
        debug!(%id, name = %removed.name, "combatant removed");
        self.log.record(
            self.state.round,
            EventKind::Removed {
                name: removed.name.clone(),
            },
        );
        Some(removed)
    }

    /// Start combat at round 1 with the highest initiative acting first.
    ///
    /// Does nothing with an empty roster.
    pub fn start(&mut self) {
        if self.state.combatants.is_empty() {
            return;
        }
        self.state.started = true;
        self.state.current_turn_index = 0;
        self.state.round = 1;
        self.reporting = false;
        info!(combatants = self.state.combatants.len(), "combat started");
        self.log.record(1, EventKind::Started);
        let first = self.current_combatant().map(|c| c.name.clone());
        self.log.record(1, EventKind::TurnPassed { to: first });
    }

    /// Pass the turn to the next active combatant.
    ///
    /// Every downed combatant loses a death save first, then the turn
    /// pointer moves on, wrapping into a new round after the last active
    /// combatant. Does nothing if no one can act.
    pub fn advance_turn(&mut self) -> TurnOutcome {
        if self.active_combatants().is_empty() {
            return TurnOutcome {
                round: self.state.round,
                ..TurnOutcome::default()
            };
        }

        let deaths = tick_death_saves(&mut self.state.combatants);
        for id in &deaths {
            if let Some(name) = self.combatant(*id).map(|c| c.name.clone()) {
                info!(%id, %name, "combatant died");
                self.log.record(self.state.round, EventKind::Died { name });
            }
        }

        let active_len = self.active_combatants().len();
        let new_round = self.state.current_turn_index + 1 >= active_len;
        if new_round {
            self.state.current_turn_index = 0;
            self.state.round += 1;
            self.log.record(
                self.state.round,
                EventKind::NewRound {
                    round: self.state.round,
                },
            );
        } else {
            self.state.current_turn_index += 1;
        }

        let to = self.current_combatant().map(|c| c.name.clone());
        debug!(round = self.state.round, index = self.state.current_turn_index, ?to, "turn advanced");
        self.log.record(self.state.round, EventKind::TurnPassed { to });

        TurnOutcome {
            new_round,
            round: self.state.round,
            deaths,
        }
    }

    /// Restore every combatant and return to idle at round 1.
    ///
    /// The roster is kept and any report is dismissed.
    pub fn reset(&mut self) {
        for combatant in &mut self.state.combatants {
            combatant.restore();
        }
        self.state.started = false;
        self.state.current_turn_index = 0;
        self.state.round = 1;
        self.reporting = false;
        info!("combat reset");
        self.log.record(1, EventKind::Reset);
    }

    /// Show the end-of-combat report. Round, roster, and started flag stay
    /// as they are.
    pub fn end(&mut self) {
        self.reporting = true;
        info!(round = self.state.round, "combat ended");
        self.log.record(self.state.round, EventKind::Ended);
    }

    /// Hide the end-of-combat report.
    pub fn dismiss_report(&mut self) {
        self.reporting = false;
    }

    /// Empty the roster and return to idle at round 1.
    pub fn clear(&mut self) {
        self.state = SharedState::default();
        self.reporting = false;
        debug!("roster cleared");
        self.log.record(1, EventKind::Cleared);
    }

    /// Build the end-of-combat summary.
    pub fn summary(&self) -> CombatSummary {
        CombatSummary::from_session(self)
    }
}

impl Default for CombatSession {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::CombatantStatus;

    fn three_way() -> (CombatSession, CombatantId, CombatantId, CombatantId) {
        let mut session = CombatSession::default();
        let a = session.add_combatant(NewCombatant::named("A").initiative(20));
        let b = session.add_combatant(NewCombatant::named("B").initiative(15));
        let c = session.add_combatant(NewCombatant::named("C").initiative(10));
        (session, a, b, c)
    }

    fn current_name(session: &CombatSession) -> Option<&str> {
        session.current_combatant().map(|c| c.name.as_str())
    }

    #[test]
    fn combat_lifecycle() {
        let (mut session, ..) = three_way();
        assert_eq!(session.phase(), CombatPhase::Idle);

        session.start();
        assert_eq!(session.phase(), CombatPhase::Active);
        assert_eq!(session.round(), 1);
        assert_eq!(current_name(&session), Some("A"));

        assert!(!session.advance_turn().new_round);
        assert_eq!(current_name(&session), Some("B"));
        assert!(!session.advance_turn().new_round);
        assert_eq!(current_name(&session), Some("C"));

        let outcome = session.advance_turn();
        assert!(outcome.new_round);
        assert_eq!(outcome.round, 2);
        assert_eq!(current_name(&session), Some("A"));
    }

    #[test]
    fn start_with_empty_roster_is_noop() {
        let mut session = CombatSession::default();
        session.start();
        assert!(!session.is_started());
        assert_eq!(session.phase(), CombatPhase::Idle);
        assert!(session.log().is_empty());
    }

    #[test]
    fn advance_with_no_active_is_noop() {
        let mut session = CombatSession::default();
        let outcome = session.advance_turn();
        assert_eq!(outcome.round, 1);
        assert!(!outcome.new_round);
        assert_eq!(session.current_turn_index(), 0);
    }

    #[test]
    fn round_wraparound_with_two() {
        let mut session = CombatSession::default();
        session.add_combatant(NewCombatant::named("A").initiative(12));
        session.add_combatant(NewCombatant::named("B").initiative(8));
        session.start();
        session.advance_turn();
        assert_eq!(session.current_turn_index(), 1);

        session.advance_turn();
        assert_eq!(session.current_turn_index(), 0);
        assert_eq!(session.round(), 2);
    }

    #[test]
    fn removal_before_current_moves_pointer_back() {
        let (mut session, a, ..) = three_way();
        session.start();
        session.advance_turn();
        session.advance_turn();
        assert_eq!(session.current_turn_index(), 2);

        let removed = session.remove_combatant(a).unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(session.current_turn_index(), 1);
        assert_eq!(current_name(&session), Some("C"));
    }

    #[test]
    fn removal_after_current_keeps_pointer() {
        let (mut session, _, _, c) = three_way();
        session.start();
        session.advance_turn();
        session.remove_combatant(c);
        assert_eq!(session.current_turn_index(), 1);
        assert_eq!(current_name(&session), Some("B"));
    }

    #[test]
    fn removal_of_current_keeps_index() {
        let (mut session, _, b, _) = three_way();
        session.start();
        session.advance_turn();
        session.remove_combatant(b);
        assert_eq!(session.current_turn_index(), 1);
        assert_eq!(current_name(&session), Some("C"));
    }

    #[test]
    fn removal_of_deceased_keeps_pointer() {
        let (mut session, a, ..) = three_way();
        session.start();
        session.advance_turn();
        session.advance_turn();
        let dead = session
            .state
            .combatants
            .iter_mut()
            .find(|c| c.id == a)
            .unwrap();
        dead.health = 0;
        dead.status = CombatantStatus::Deceased;
        // A is no longer in the active order, so C now sits at index 1.
        session.state.current_turn_index = 1;

        session.remove_combatant(a);
        assert_eq!(session.current_turn_index(), 1);
        assert_eq!(current_name(&session), Some("C"));
    }

    #[test]
    fn remove_unknown_is_noop() {
        let (mut session, ..) = three_way();
        session.start();
        assert!(session.remove_combatant(CombatantId::new()).is_none());
        assert_eq!(session.combatants().len(), 3);
    }

    #[test]
    fn death_saves_tick_on_every_advance() {
        let (mut session, _, b, _) = three_way();
        session.start();
        session.update_combatant(
            b,
            CombatantPatch {
                health: Some(0),
                ..CombatantPatch::default()
            },
        );
        assert_eq!(session.combatant(b).unwrap().death_save_count(), Some(3));

        session.advance_turn();
        session.advance_turn();
        assert_eq!(session.combatant(b).unwrap().death_save_count(), Some(1));

        let outcome = session.advance_turn();
        assert_eq!(outcome.deaths, vec![b]);
        let downed = session.combatant(b).unwrap();
        assert!(downed.is_deceased());
        assert_eq!(downed.death_save_count(), Some(0));

        let outcome = session.advance_turn();
        assert!(outcome.deaths.is_empty());
        assert!(session.combatant(b).unwrap().is_deceased());
        assert_eq!(session.combatant(b).unwrap().death_save_count(), Some(0));
    }

    #[test]
    fn death_on_the_last_save_shortens_the_round() {
        let (mut session, a, _, c) = three_way();
        session.start();
        session.state.current_turn_index = 1;
        let last = &mut session.state.combatants[2];
        last.health = 0;
        last.status = CombatantStatus::Down { death_saves: 1 };

        let outcome = session.advance_turn();
        assert_eq!(outcome.deaths, vec![c]);
        assert!(outcome.new_round);
        assert_eq!(outcome.round, 2);
        assert_eq!(session.current_turn_index(), 0);
        assert_eq!(session.current_combatant().map(|x| x.id), Some(a));
    }

    #[test]
    fn deceased_never_get_the_turn() {
        let (mut session, _, b, _) = three_way();
        session.start();
        session.update_combatant(
            b,
            CombatantPatch {
                health: Some(0),
                ..CombatantPatch::default()
            },
        );
        for _ in 0..3 {
            session.advance_turn();
        }
        assert!(session.combatant(b).unwrap().is_deceased());
        for _ in 0..6 {
            assert_ne!(session.current_combatant().map(|c| c.id), Some(b));
            session.advance_turn();
        }
        assert_eq!(session.active_combatants().len(), 2);
        assert_eq!(session.sorted_combatants().len(), 3);
        assert!(session.combatant(b).is_some());
    }

    #[test]
    fn reset_restores_everyone() {
        let (mut session, a, b, _) = three_way();
        session.start();
        session.adjust_health(a, -12);
        session.adjust_stamina(a, -5);
        session.update_combatant(
            b,
            CombatantPatch {
                health: Some(0),
                ..CombatantPatch::default()
            },
        );
        for _ in 0..4 {
            session.advance_turn();
        }

        session.reset();
        let once = session.shared_state().clone();
        session.reset();
        assert_eq!(session.shared_state(), &once);

        assert!(!session.is_started());
        assert_eq!(session.round(), 1);
        assert_eq!(session.current_turn_index(), 0);
        assert_eq!(session.combatants().len(), 3);
        for c in session.combatants() {
            assert_eq!(c.health, c.max_health);
            assert_eq!(c.stamina, c.max_stamina);
            assert_eq!(c.status, CombatantStatus::Healthy);
            assert_eq!(c.damage_taken, 0);
            assert_eq!(c.damage_dealt, 0);
        }
    }

    #[test]
    fn end_is_presentation_only() {
        let (mut session, ..) = three_way();
        session.start();
        session.advance_turn();
        session.end();
        assert_eq!(session.phase(), CombatPhase::Reporting);
        assert!(session.is_started());
        assert_eq!(session.current_turn_index(), 1);

        session.advance_turn();
        assert_eq!(session.current_turn_index(), 2);

        session.dismiss_report();
        assert_eq!(session.phase(), CombatPhase::Active);
    }

    #[test]
    fn clear_empties_roster() {
        let (mut session, ..) = three_way();
        session.start();
        session.advance_turn();
        session.clear();
        assert!(session.combatants().is_empty());
        assert!(!session.is_started());
        assert_eq!(session.round(), 1);
        assert_eq!(session.current_turn_index(), 0);
    }

    #[test]
    fn add_character_is_player() {
        let mut session = CombatSession::default();
        let id = session.add_character(&CharacterRecord {
            name: "Ilsa".to_string(),
            max_health: 25,
            max_stamina: 10,
            initiative: Some(18),
        });
        let c = session.combatant(id).unwrap();
        assert!(c.is_player);
        assert_eq!(c.initiative, 18);
        assert_eq!(session.find_by_name("ilsa").map(|c| c.id), Some(id));
    }

    #[test]
    fn log_records_transitions() {
        let (mut session, ..) = three_way();
        session.start();
        session.advance_turn();
        let kinds: Vec<&EventKind> = session.log().entries().iter().map(|e| &e.kind).collect();
        assert!(kinds.contains(&&EventKind::Started));
        assert!(kinds.contains(&&EventKind::TurnPassed {
            to: Some("B".to_string())
        }));
    }
}
