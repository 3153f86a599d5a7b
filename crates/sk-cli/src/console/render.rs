//! Text rendering of the combat state.

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use sk_combat::{CombatPhase, CombatSession, CombatantStatus};

pub fn status(session: &CombatSession) -> String {
    if session.combatants().is_empty() {
        return "  No combatants yet.".to_string();
    }

    let phase = match session.phase() {
        CombatPhase::Idle => "not started",
        CombatPhase::Active => "in progress",
        CombatPhase::Reporting => "ended",
    };
    let current = session.current_combatant().map(|c| c.id);

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "Name", "Init", "HP", "Stamina", "Status", "Side"]);

    for c in session.sorted_combatants() {
        let marker = if session.is_started() && current == Some(c.id) {
            ">"
        } else {
            ""
        };
        let status = match c.status {
            CombatantStatus::Healthy => c.status.to_string(),
            CombatantStatus::Down { .. } => c.status.to_string().yellow().to_string(),
            CombatantStatus::Deceased => c.status.to_string().red().to_string(),
        };
        let side = if c.is_player { "player" } else { "enemy" };
        table.add_row(vec![
            marker.to_string(),
            c.name.clone(),
            c.initiative.to_string(),
            format!("{}/{}", c.health, c.max_health),
            format!("{}/{}", c.stamina, c.max_stamina),
            status,
            side.to_string(),
        ]);
    }

    format!(
        "  {} {} ({phase})\n{table}",
        "Round".bold(),
        session.round()
    )
}

pub fn turn(session: &CombatSession) -> String {
    match session.current_combatant() {
        Some(c) => format!("Round {}: {}'s turn", session.round(), c.name.bold()),
        None => format!("Round {}: no one can act", session.round()),
    }
}

pub fn log(session: &CombatSession) -> String {
    let log = session.log();
    if log.is_empty() {
        return "  The log is empty.".to_string();
    }
    log.recent(20)
        .iter()
        .map(|e| format!("  [round {}] {}", e.round, e.kind))
        .collect::<Vec<_>>()
        .join("\n")
}
