//! Life status and the death-save countdown.
//!
//! A combatant knocked to zero health goes `Down` with [`DEATH_SAVES`]
//! saves left. Every turn advance ticks one save off every downed
//! combatant; running out makes them `Deceased`. Healing above zero at any
//! point escapes the countdown, and going down again starts it over.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Combatant, CombatantId};

/// Number of death saves a combatant gets each time they go down.
pub const DEATH_SAVES: u8 = 3;

/// Whether a combatant is up, dying, or dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CombatantStatus {
    /// Above zero health.
    #[default]
    Healthy,
    /// At zero health and counting down.
    Down {
        /// Death saves left before the combatant dies (1..=3).
        #[serde(rename = "deathSaves")]
        death_saves: u8,
    },
    /// Out of death saves. Skipped in the turn order until restored.
    Deceased,
}

impl CombatantStatus {
    /// A freshly downed status with a full set of death saves.
    pub fn down() -> Self {
        Self::Down {
            death_saves: DEATH_SAVES,
        }
    }

    /// Returns true if the combatant is above zero health.
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Returns true if the combatant is at zero health but still alive.
    pub fn is_down(self) -> bool {
        matches!(self, Self::Down { .. })
    }

    /// Returns true once the death saves have run out.
    pub fn is_deceased(self) -> bool {
        matches!(self, Self::Deceased)
    }

    /// The remaining death saves: `None` while healthy, `0` once deceased.
    pub fn death_save_count(self) -> Option<u8> {
        match self {
            Self::Healthy => None,
            Self::Down { death_saves } => Some(death_saves),
            Self::Deceased => Some(0),
        }
    }

    /// Consume one death save. Healthy and deceased statuses are unchanged.
    pub fn tick(self) -> Self {
        match self {
            Self::Down { death_saves } if death_saves <= 1 => Self::Deceased,
            Self::Down { death_saves } => Self::Down {
                death_saves: death_saves - 1,
            },
            other => other,
        }
    }

    /// The status that follows a health change from `old` to `new`.
    ///
    /// Any health above zero is healthy, whatever came before. Dropping to
    /// zero from above starts a fresh countdown unless already deceased.
    pub fn after_health_change(self, old: u32, new: u32) -> Self {
        if new > 0 {
            Self::Healthy
        } else if old > 0 && !self.is_deceased() {
            Self::down()
        } else {
            self
        }
    }
}

impl fmt::Display for CombatantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Down { death_saves: 1 } => write!(f, "down (1 save left)"),
            Self::Down { death_saves } => write!(f, "down ({death_saves} saves left)"),
            Self::Deceased => write!(f, "deceased"),
        }
    }
}

/// Run one death-save tick over the whole roster.
///
/// Returns the ids of combatants who died on this tick.
pub fn tick_death_saves(roster: &mut [Combatant]) -> Vec<CombatantId> {
    let mut deaths = Vec::new();
    for combatant in roster.iter_mut().filter(|c| c.status.is_down()) {
        combatant.status = combatant.status.tick();
        if combatant.status.is_deceased() {
            deaths.push(combatant.id);
        }
    }
    deaths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::NewCombatant;

    #[test]
    fn countdown_reaches_deceased() {
        let mut status = CombatantStatus::down();
        assert_eq!(status.death_save_count(), Some(3));
        status = status.tick();
        assert_eq!(status.death_save_count(), Some(2));
        status = status.tick();
        assert_eq!(status.death_save_count(), Some(1));
        status = status.tick();
        assert!(status.is_deceased());
        assert_eq!(status.death_save_count(), Some(0));
        assert_eq!(status.tick(), CombatantStatus::Deceased);
    }

    #[test]
    fn tick_leaves_healthy_alone() {
        assert_eq!(CombatantStatus::Healthy.tick(), CombatantStatus::Healthy);
        assert_eq!(CombatantStatus::Healthy.death_save_count(), None);
    }

    #[test]
    fn health_change_transitions() {
        let healthy = CombatantStatus::Healthy;
        assert_eq!(healthy.after_health_change(5, 0), CombatantStatus::down());
        assert_eq!(healthy.after_health_change(5, 3), CombatantStatus::Healthy);

        let dying = CombatantStatus::Down { death_saves: 2 };
        assert_eq!(dying.after_health_change(0, 4), CombatantStatus::Healthy);
        assert_eq!(dying.after_health_change(0, 0), dying);

        let dead = CombatantStatus::Deceased;
        assert_eq!(dead.after_health_change(0, 0), CombatantStatus::Deceased);
        assert_eq!(dead.after_health_change(0, 1), CombatantStatus::Healthy);
    }

    #[test]
    fn roster_tick_reports_deaths() {
        let mut roster = vec![
            Combatant::new(NewCombatant::named("Alice")),
            Combatant::new(NewCombatant::named("Bob")),
            Combatant::new(NewCombatant::named("Cara")),
        ];
        roster[0].health = 0;
        roster[0].status = CombatantStatus::Down { death_saves: 1 };
        roster[1].health = 0;
        roster[1].status = CombatantStatus::down();

        let deaths = tick_death_saves(&mut roster);
        assert_eq!(deaths, vec![roster[0].id]);
        assert!(roster[0].status.is_deceased());
        assert_eq!(roster[1].status.death_save_count(), Some(2));
        assert!(roster[2].status.is_healthy());
    }

    #[test]
    fn display() {
        assert_eq!(CombatantStatus::Healthy.to_string(), "healthy");
        assert_eq!(CombatantStatus::down().to_string(), "down (3 saves left)");
        assert_eq!(
            CombatantStatus::Down { death_saves: 1 }.to_string(),
            "down (1 save left)"
        );
        assert_eq!(CombatantStatus::Deceased.to_string(), "deceased");
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&CombatantStatus::Down { death_saves: 2 }).unwrap();
        assert_eq!(json, r#"{"state":"down","deathSaves":2}"#);
        let back: CombatantStatus = serde_json::from_str(r#"{"state":"deceased"}"#).unwrap();
        assert_eq!(back, CombatantStatus::Deceased);
    }
}
