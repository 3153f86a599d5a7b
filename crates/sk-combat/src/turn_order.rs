//! Turn order, derived fresh from the roster on every read.
//!
//! Combatants act in descending initiative. Ties keep roster order, so the
//! first of two equal initiatives added to the fight acts first. Deceased
//! combatants stay in the sorted order but are skipped when taking turns.

use std::cmp::Reverse;

use crate::combatant::{Combatant, CombatantId};

/// The whole roster sorted by initiative, highest first (stable).
pub fn sorted_combatants(roster: &[Combatant]) -> Vec<&Combatant> {
    let mut sorted: Vec<&Combatant> = roster.iter().collect();
    sorted.sort_by_key(|c| Reverse(c.initiative));
    sorted
}

/// The sorted order without deceased combatants. Turns index into this.
pub fn active_combatants(roster: &[Combatant]) -> Vec<&Combatant> {
    sorted_combatants(roster)
        .into_iter()
        .filter(|c| !c.is_deceased())
        .collect()
}

/// Position of a combatant within the active order, if they take turns.
pub fn active_position(roster: &[Combatant], id: CombatantId) -> Option<usize> {
    active_combatants(roster).iter().position(|c| c.id == id)
}
