//! Health and stamina mutation, damage accounting, and revives.
//!
//! [`CombatSession::update_combatant`] merges fields as given. The
//! `adjust_*` helpers clamp into `[0, max]` before going through it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combatant::{CombatantId, CombatantStatus};

use super::{CombatSession, EventKind};

/// Fields to merge into a combatant. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantPatch {
    /// New display name.
    pub name: Option<String>,
    /// New initiative.
    pub initiative: Option<i32>,
    /// New health.
    pub health: Option<u32>,
    /// New maximum health.
    pub max_health: Option<u32>,
    /// New stamina.
    pub stamina: Option<u32>,
    /// New maximum stamina.
    pub max_stamina: Option<u32>,
    /// New player flag.
    pub is_player: Option<bool>,
}

/// Health before and after a merge, for logging and attribution.
struct HealthChange {
    name: String,
    old_health: u32,
    new_health: u32,
    old_status: CombatantStatus,
    new_status: CombatantStatus,
}

impl HealthChange {
    fn lost(&self) -> u32 {
        self.old_health.saturating_sub(self.new_health)
    }

    fn gained(&self) -> u32 {
        self.new_health.saturating_sub(self.old_health)
    }
}

fn apply_delta(current: u32, delta: i32, max: u32) -> u32 {
    let target = (i64::from(current) + i64::from(delta)).clamp(0, i64::from(max));
    u32::try_from(target).unwrap_or(max)
}

impl CombatSession {
    /// Merge `patch` into the named combatant.
    ///
    /// A health drop is added to `damage_taken`. Dropping to zero from above
    /// starts a fresh death-save countdown; any health above zero clears the
    /// countdown and the deceased flag. Nothing is clamped here and
    /// `damage_dealt` is never touched. Unknown ids are ignored.
    pub fn update_combatant(&mut self, id: CombatantId, patch: CombatantPatch) {
        if let Some(change) = self.merge_patch(id, patch) {
            self.record_health_change(&change, None);
        }
    }

    /// Change health by `delta`, clamped to `[0, max_health]`.
    pub fn adjust_health(&mut self, id: CombatantId, delta: i32) {
        let Some(c) = self.combatant(id) else {
            return;
        };
        let health = apply_delta(c.health, delta, c.max_health);
        self.update_combatant(
            id,
            CombatantPatch {
                health: Some(health),
                ..CombatantPatch::default()
            },
        );
    }

    /// Change stamina by `delta`, clamped to `[0, max_stamina]`.
    pub fn adjust_stamina(&mut self, id: CombatantId, delta: i32) {
        let Some(c) = self.combatant(id) else {
            return;
        };
        let stamina = apply_delta(c.stamina, delta, c.max_stamina);
        self.update_combatant(
            id,
            CombatantPatch {
                stamina: Some(stamina),
                ..CombatantPatch::default()
            },
        );
    }

    /// Heal by `amount`, up to max health.
    pub fn heal(&mut self, id: CombatantId, amount: u32) {
        self.adjust_health(id, i32::try_from(amount).unwrap_or(i32::MAX));
    }

    /// Deal `amount` damage to `target`, clamped at zero health.
    ///
    /// When `attacker` names a combatant on the roster, the health actually
    /// removed is credited to their `damage_dealt`.
    pub fn apply_damage(&mut self, target: CombatantId, amount: u32, attacker: Option<CombatantId>) {
        let Some(c) = self.combatant(target) else {
            return;
        };
        let health = c.health.saturating_sub(amount).min(c.max_health);
        let patch = CombatantPatch {
            health: Some(health),
            ..CombatantPatch::default()
        };
        let Some(change) = self.merge_patch(target, patch) else {
            return;
        };

        let dealt = change.lost();
        let attacker_name = attacker.and_then(|attacker_id| {
            let a = self
                .state
                .combatants
                .iter_mut()
                .find(|c| c.id == attacker_id)?;
            a.damage_dealt = a.damage_dealt.saturating_add(dealt);
            Some(a.name.clone())
        });
        self.record_health_change(&change, attacker_name);
    }

    /// Bring a combatant back at 1 health with the countdown cleared.
    ///
    /// Meant for downed combatants, but performs no check.
    pub fn revive_combatant(&mut self, id: CombatantId) {
        let Some(c) = self.state.combatants.iter_mut().find(|c| c.id == id) else {
            return;
        };
        c.health = 1;
        c.status = CombatantStatus::Healthy;
        info!(%id, name = %c.name, "combatant revived");
        let name = c.name.clone();
        self.log.record(self.state.round, EventKind::Revived { name });
    }

    fn merge_patch(&mut self, id: CombatantId, patch: CombatantPatch) -> Option<HealthChange> {
        let c = self.state.combatants.iter_mut().find(|c| c.id == id)?;
        let old_health = c.health;
        let old_status = c.status;

        if let Some(health) = patch.health {
            if health < old_health {
                c.damage_taken = c.damage_taken.saturating_add(old_health - health);
            }
            c.health = health;
            c.status = c.status.after_health_change(old_health, health);
        }
        if let Some(name) = patch.name {
            c.name = name;
        }
        if let Some(initiative) = patch.initiative {
            c.initiative = initiative;
        }
        if let Some(max_health) = patch.max_health {
            c.max_health = max_health;
        }
        if let Some(stamina) = patch.stamina {
            c.stamina = stamina;
        }
        if let Some(max_stamina) = patch.max_stamina {
            c.max_stamina = max_stamina;
        }
        if let Some(is_player) = patch.is_player {
            c.is_player = is_player;
        }

        Some(HealthChange {
            name: c.name.clone(),
            old_health,
            new_health: c.health,
            old_status,
            new_status: c.status,
        })
    }

    fn record_health_change(&mut self, change: &HealthChange, attacker: Option<String>) {
        let round = self.state.round;
        let name = change.name.clone();

        if change.lost() > 0 {
            debug!(%name, amount = change.lost(), "damage taken");
            self.log.record(
                round,
                EventKind::Damaged {
                    name: name.clone(),
                    amount: change.lost(),
                    attacker,
                },
            );
        } else if change.gained() > 0 {
            debug!(%name, amount = change.gained(), "healed");
            self.log.record(
                round,
                EventKind::Healed {
                    name: name.clone(),
                    amount: change.gained(),
                },
            );
        }

        if change.new_status.is_down() && !change.old_status.is_down() {
            info!(%name, "combatant down");
            self.log.record(round, EventKind::Downed { name });
        }
    }
}
