//! End-of-combat report.

use std::fmt;

use crate::combatant::{CombatantId, CombatantStatus};

use super::CombatSession;

/// One combatant's line in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    /// Combatant id.
    pub id: CombatantId,
    /// Combatant name.
    pub name: String,
    /// Player-controlled flag.
    pub is_player: bool,
    /// Status at the time of the report.
    pub status: CombatantStatus,
    /// Health lost over the fight.
    pub damage_taken: u32,
    /// Damage attributed to this combatant.
    pub damage_dealt: u32,
}

/// Who took and dealt how much over the fight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatSummary {
    /// Round the fight reached.
    pub rounds: u32,
    /// Rows sorted by damage taken, most first.
    pub rows: Vec<SummaryRow>,
}

impl CombatSummary {
    /// Build the report from the current roster.
    pub fn from_session(session: &CombatSession) -> Self {
        let mut rows: Vec<SummaryRow> = session
            .combatants()
            .iter()
            .map(|c| SummaryRow {
                id: c.id,
                name: c.name.clone(),
                is_player: c.is_player,
                status: c.status,
                damage_taken: c.damage_taken,
                damage_dealt: c.damage_dealt,
            })
            .collect();
        rows.sort_by(|a, b| b.damage_taken.cmp(&a.damage_taken));
        Self {
            rounds: session.round(),
            rows,
        }
    }

    /// Total damage taken by player characters.
    pub fn player_damage_taken(&self) -> u32 {
        self.rows
            .iter()
            .filter(|r| r.is_player)
            .map(|r| r.damage_taken)
            .sum()
    }

    /// Total damage taken by enemies.
    pub fn enemy_damage_taken(&self) -> u32 {
        self.rows
            .iter()
            .filter(|r| !r.is_player)
            .map(|r| r.damage_taken)
            .sum()
    }

    /// Names of everyone who died.
    pub fn fallen(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.status.is_deceased())
            .map(|r| r.name.as_str())
            .collect()
    }
}

impl fmt::Display for CombatSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Combat over after {} round(s)", self.rounds)?;
        for row in &self.rows {
            let side = if row.is_player { "player" } else { "enemy" };
            writeln!(
                f,
                "  {} ({side}, {}): took {}, dealt {}",
                row.name, row.status, row.damage_taken, row.damage_dealt
            )?;
        }
        writeln!(
            f,
            "  Damage taken: players {}, enemies {}",
            self.player_damage_taken(),
            self.enemy_damage_taken()
        )?;
        let fallen = self.fallen();
        if !fallen.is_empty() {
            writeln!(f, "  Fallen: {}", fallen.join(", "))?;
        }
        Ok(())
    }
}
