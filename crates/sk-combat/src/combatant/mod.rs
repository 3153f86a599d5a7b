//! Combatants: the participants tracked during a fight.

pub mod status;

pub use status::{CombatantStatus, DEATH_SAVES};

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TrackerConfig;

/// Unique identifier for a combatant, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    /// Generate a new random combatant ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// One participant in combat, player character or enemy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    /// Stable identifier.
    pub id: CombatantId,
    /// Display name.
    pub name: String,
    /// Initiative score (higher acts first).
    pub initiative: i32,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Current stamina.
    pub stamina: u32,
    /// Maximum stamina.
    pub max_stamina: u32,
    /// Player-controlled rather than an NPC. Display only.
    pub is_player: bool,
    /// Healthy, down with death saves, or deceased.
    pub status: CombatantStatus,
    /// Health lost over the session.
    pub damage_taken: u32,
    /// Damage attributed to this combatant as an attacker.
    pub damage_dealt: u32,
}

impl Combatant {
    /// Create a combatant with the default fallbacks.
    pub fn new(attrs: NewCombatant) -> Self {
        Self::create(attrs, &TrackerConfig::default())
    }

    /// Create a combatant, filling missing or invalid fields from `config`.
    ///
    /// The combatant starts at full health and stamina with zeroed counters.
    pub fn create(attrs: NewCombatant, config: &TrackerConfig) -> Self {
        let max_health = attrs
            .max_health
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0)
            .unwrap_or(config.default_max_health)
            .max(1);
        let max_stamina = attrs
            .max_stamina
            .and_then(|v| u32::try_from(v).ok())
            .filter(|&v| v > 0)
            .unwrap_or(config.default_max_stamina);
        let name = match attrs.name.trim() {
            "" => "Unnamed".to_string(),
            trimmed => trimmed.to_string(),
        };

        Self {
            id: CombatantId::new(),
            name,
            initiative: attrs.initiative.unwrap_or(config.default_initiative),
            health: max_health,
            max_health,
            stamina: max_stamina,
            max_stamina,
            is_player: attrs.is_player,
            status: CombatantStatus::Healthy,
            damage_taken: 0,
            damage_dealt: 0,
        }
    }

    /// Returns true once the combatant is out of death saves.
    pub fn is_deceased(&self) -> bool {
        self.status.is_deceased()
    }

    /// Remaining death saves, if the combatant is down or deceased.
    pub fn death_save_count(&self) -> Option<u8> {
        self.status.death_save_count()
    }

    /// Restore full health and stamina and clear all session counters.
    pub(crate) fn restore(&mut self) {
        self.health = self.max_health;
        self.stamina = self.max_stamina;
        self.status = CombatantStatus::Healthy;
        self.damage_taken = 0;
        self.damage_dealt = 0;
    }
}

impl fmt::Display for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (init {}, HP {}/{}, ST {}/{}, {})",
            self.name,
            self.initiative,
            self.health,
            self.max_health,
            self.stamina,
            self.max_stamina,
            self.status
        )
    }
}

/// Attributes for adding a combatant. Missing numbers fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCombatant {
    /// Display name.
    pub name: String,
    /// Initiative score.
    pub initiative: Option<i32>,
    /// Maximum health. Non-positive values are invalid.
    pub max_health: Option<i64>,
    /// Maximum stamina. Non-positive values are invalid.
    pub max_stamina: Option<i64>,
    /// Player-controlled flag.
    pub is_player: bool,
}

impl NewCombatant {
    /// Start with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build from raw form fields; anything that isn't an integer is dropped.
    pub fn from_form(name: &str, initiative: &str, max_health: &str, max_stamina: &str) -> Self {
        Self {
            name: name.to_string(),
            initiative: initiative.trim().parse().ok(),
            max_health: max_health.trim().parse().ok(),
            max_stamina: max_stamina.trim().parse().ok(),
            is_player: false,
        }
    }

    /// Set the initiative.
    pub fn initiative(mut self, initiative: i32) -> Self {
        self.initiative = Some(initiative);
        self
    }

    /// Set the maximum health.
    pub fn max_health(mut self, max_health: i64) -> Self {
        self.max_health = Some(max_health);
        self
    }

    /// Set the maximum stamina.
    pub fn max_stamina(mut self, max_stamina: i64) -> Self {
        self.max_stamina = Some(max_stamina);
        self
    }

    /// Mark as player-controlled.
    pub fn player(mut self) -> Self {
        self.is_player = true;
        self
    }
}

/// A saved character, as handed over by the character roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    /// Character name.
    pub name: String,
    /// Maximum health from the sheet.
    pub max_health: i64,
    /// Maximum stamina from the sheet.
    pub max_stamina: i64,
    /// Initiative, if already rolled.
    #[serde(default)]
    pub initiative: Option<i32>,
}

impl From<&CharacterRecord> for NewCombatant {
    fn from(record: &CharacterRecord) -> Self {
        Self {
            name: record.name.clone(),
            initiative: record.initiative,
            max_health: Some(record.max_health),
            max_stamina: Some(record.max_stamina),
            is_player: true,
        }
    }
}

/// Roll a d20 initiative with a modifier.
pub fn roll_initiative<R: Rng + ?Sized>(rng: &mut R, modifier: i32) -> i32 {
    rng.random_range(1..=20i32).saturating_add(modifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn create_with_defaults() {
        let c = Combatant::new(NewCombatant::named("Goblin"));
        assert_eq!(c.name, "Goblin");
        assert_eq!(c.initiative, 10);
        assert_eq!((c.health, c.max_health), (50, 50));
        assert_eq!((c.stamina, c.max_stamina), (20, 20));
        assert_eq!(c.status, CombatantStatus::Healthy);
        assert_eq!(c.damage_taken, 0);
        assert_eq!(c.damage_dealt, 0);
        assert!(!c.is_player);
    }

    #[test]
    fn create_with_values() {
        let c = Combatant::new(
            NewCombatant::named("Kael")
                .initiative(17)
                .max_health(30)
                .max_stamina(8)
                .player(),
        );
        assert_eq!(c.initiative, 17);
        assert_eq!((c.health, c.max_health), (30, 30));
        assert_eq!((c.stamina, c.max_stamina), (8, 8));
        assert!(c.is_player);
    }

    #[test]
    fn ids_are_unique() {
        let a = Combatant::new(NewCombatant::named("A"));
        let b = Combatant::new(NewCombatant::named("A"));
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.to_string().len(), 8);
    }

    #[test]
    fn invalid_form_fields_fall_back() {
        let c = Combatant::new(NewCombatant::from_form("Orc", "fast", "-4", "0"));
        assert_eq!(c.initiative, 10);
        assert_eq!(c.max_health, 50);
        assert_eq!(c.max_stamina, 20);
    }

    #[test]
    fn valid_form_fields_parse() {
        let c = Combatant::new(NewCombatant::from_form(" Orc ", " 14", "22 ", "6"));
        assert_eq!(c.name, "Orc");
        assert_eq!(c.initiative, 14);
        assert_eq!(c.max_health, 22);
        assert_eq!(c.max_stamina, 6);
    }

    #[test]
    fn empty_name_falls_back() {
        let c = Combatant::new(NewCombatant::named("   "));
        assert_eq!(c.name, "Unnamed");
    }

    #[test]
    fn config_fallbacks() {
        let config = TrackerConfig::default()
            .with_default_initiative(5)
            .with_default_max_health(12)
            .with_default_max_stamina(3);
        let c = Combatant::create(NewCombatant::named("Rat"), &config);
        assert_eq!(c.initiative, 5);
        assert_eq!(c.max_health, 12);
        assert_eq!(c.max_stamina, 3);
    }

    #[test]
    fn character_record_is_player() {
        let record = CharacterRecord {
            name: "Ilsa".to_string(),
            max_health: 40,
            max_stamina: 15,
            initiative: None,
        };
        let c = Combatant::new(NewCombatant::from(&record));
        assert!(c.is_player);
        assert_eq!(c.max_health, 40);
        assert_eq!(c.initiative, 10);
    }

    #[test]
    fn roll_initiative_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let roll = roll_initiative(&mut rng, 2);
            assert!((3..=22).contains(&roll));
        }
    }

    #[test]
    fn display() {
        let c = Combatant::new(NewCombatant::named("Bob").initiative(12).max_health(10));
        assert_eq!(c.to_string(), "Bob (init 12, HP 10/10, ST 20/20, healthy)");
    }

    #[test]
    fn serde_uses_camel_case() {
        let c = Combatant::new(NewCombatant::named("Bob"));
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("maxHealth").is_some());
        assert!(json.get("damageTaken").is_some());
        let back: Combatant = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }
}
