//! Combat log: a local, timestamped record of what happened.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened in a logged combat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Combat started at round 1.
    Started,
    /// A combatant joined the roster.
    Added {
        /// Combatant name.
        name: String,
    },
    /// A combatant left the roster.
    Removed {
        /// Combatant name.
        name: String,
    },
    /// The turn passed to the named combatant, if anyone can act.
    TurnPassed {
        /// Whose turn it is now.
        to: Option<String>,
    },
    /// A new round began.
    NewRound {
        /// The round number that began.
        round: u32,
    },
    /// A combatant lost health.
    Damaged {
        /// Who was hurt.
        name: String,
        /// Health lost.
        amount: u32,
        /// Who dealt the damage, if attributed.
        attacker: Option<String>,
    },
    /// A combatant regained health.
    Healed {
        /// Who was healed.
        name: String,
        /// Health regained.
        amount: u32,
    },
    /// A combatant dropped to zero health and started making death saves.
    Downed {
        /// Who went down.
        name: String,
    },
    /// A combatant ran out of death saves.
    Died {
        /// Who died.
        name: String,
    },
    /// A downed combatant was brought back to 1 health.
    Revived {
        /// Who was revived.
        name: String,
    },
    /// Everyone was restored and combat returned to idle.
    Reset,
    /// The roster was emptied.
    Cleared,
    /// Combat was ended and the report shown.
    Ended,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Combat started"),
            Self::Added { name } => write!(f, "{name} joins the fight"),
            Self::Removed { name } => write!(f, "{name} leaves the fight"),
            Self::TurnPassed { to: Some(name) } => write!(f, "{name}'s turn"),
            Self::TurnPassed { to: None } => write!(f, "No one is left to act"),
            Self::NewRound { round } => write!(f, "Round {round} begins"),
            Self::Damaged {
                name,
                amount,
                attacker: Some(attacker),
            } => write!(f, "{attacker} hits {name} for {amount}"),
            Self::Damaged { name, amount, .. } => write!(f, "{name} takes {amount} damage"),
            Self::Healed { name, amount } => write!(f, "{name} recovers {amount} health"),
            Self::Downed { name } => write!(f, "{name} is down and making death saves"),
            Self::Died { name } => write!(f, "{name} has died"),
            Self::Revived { name } => write!(f, "{name} is revived"),
            Self::Reset => write!(f, "Combat reset"),
            Self::Cleared => write!(f, "Roster cleared"),
            Self::Ended => write!(f, "Combat ended"),
        }
    }
}

/// A single entry in the combat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Round in which the event happened.
    pub round: u32,
    /// What happened.
    pub kind: EventKind,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Chronological log of combat events.
///
/// Entries survive `reset` and `clear` so a whole evening can be exported;
/// the log lives as long as the session that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vec<CombatEvent>,
}

impl CombatLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn record(&mut self, round: u32, kind: EventKind) {
        self.entries.push(CombatEvent {
            round,
            kind,
            timestamp: Utc::now(),
        });
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[CombatEvent] {
        &self.entries
    }

    /// The most recent `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[CombatEvent] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the log as markdown, grouped by round.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Combat Log\n\n");
        let mut current_round = None;
        for entry in &self.entries {
            if current_round != Some(entry.round) {
                out.push_str(&format!("## Round {}\n\n", entry.round));
                current_round = Some(entry.round);
            }
            out.push_str(&format!(
                "- `{}` {}\n",
                entry.timestamp.format("%H:%M:%S"),
                entry.kind
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_recent() {
        let mut log = CombatLog::new();
        assert!(log.is_empty());
        log.record(1, EventKind::Started);
        log.record(1, EventKind::TurnPassed { to: Some("Bob".to_string()) });
        log.record(2, EventKind::NewRound { round: 2 });
        assert_eq!(log.len(), 3);
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(2)[0].kind.to_string(), "Bob's turn");
        assert_eq!(log.recent(10).len(), 3);
    }

    #[test]
    fn damage_display() {
        let attributed = EventKind::Damaged {
            name: "Orc".to_string(),
            amount: 7,
            attacker: Some("Kael".to_string()),
        };
        assert_eq!(attributed.to_string(), "Kael hits Orc for 7");
        let plain = EventKind::Damaged {
            name: "Orc".to_string(),
            amount: 7,
            attacker: None,
        };
        assert_eq!(plain.to_string(), "Orc takes 7 damage");
    }

    #[test]
    fn markdown_groups_rounds() {
        let mut log = CombatLog::new();
        log.record(1, EventKind::Started);
        log.record(2, EventKind::NewRound { round: 2 });
        log.record(2, EventKind::Died { name: "Orc".to_string() });
        let md = log.export_markdown();
        assert!(md.starts_with("# Combat Log"));
        assert!(md.contains("## Round 1"));
        assert!(md.contains("## Round 2"));
        assert!(md.contains("Orc has died"));
        assert_eq!(md.matches("## Round 2").count(), 1);
    }
}
