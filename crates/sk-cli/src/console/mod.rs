//! Line-based console driving a tracker.

mod command;
mod render;

use std::sync::Arc;

use colored::Colorize;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use sk_combat::{
    CombatSession, CombatantId, CombatantPatch, NewCombatant, SessionStore, SyncedTracker,
    roll_initiative,
};

use command::{Command, HELP};

/// Read commands from stdin until EOF or `quit`.
pub async fn run<S: SessionStore>(tracker: Arc<Mutex<SyncedTracker<S>>>) -> Result<(), String> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        stdout.write_all(b"> ").await.map_err(|e| e.to_string())?;
        stdout.flush().await.map_err(|e| e.to_string())?;

        let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? else {
            break; // EOF
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(e) => {
                println!("{}\n", e.yellow());
                continue;
            }
        };
        if command == Command::Quit {
            println!("Goodbye!");
            break;
        }

        let mut tracker = tracker.lock().await;
        match execute(&mut tracker, command).await {
            Ok(output) => println!("{output}\n"),
            Err(e) => println!("{}\n", e.yellow()),
        }
    }

    Ok(())
}

fn resolve(session: &CombatSession, name: &str) -> Result<CombatantId, String> {
    session
        .find_by_name(name)
        .map(|c| c.id)
        .ok_or_else(|| format!("no combatant named '{name}'"))
}

fn describe(session: &CombatSession, id: CombatantId) -> String {
    session
        .combatant(id)
        .map(|c| c.to_string())
        .unwrap_or_default()
}

async fn execute<S: SessionStore>(
    tracker: &mut SyncedTracker<S>,
    command: Command,
) -> Result<String, String> {
    let output = match command {
        Command::Add {
            name,
            initiative,
            max_health,
            max_stamina,
            player,
        } => {
            let mut attrs = NewCombatant::from_form(&name, &initiative, &max_health, &max_stamina);
            attrs.is_player = player;
            let id = tracker.mutate(|s| s.add_combatant(attrs)).await;
            format!("Added {}", describe(tracker.session(), id))
        }
        Command::Roll {
            name,
            modifier,
            player,
        } => {
            let initiative = roll_initiative(&mut rand::rng(), modifier);
            let mut attrs = NewCombatant::named(name).initiative(initiative);
            attrs.is_player = player;
            let id = tracker.mutate(|s| s.add_combatant(attrs)).await;
            format!("Rolled {initiative}: added {}", describe(tracker.session(), id))
        }
        Command::Remove(name) => {
            let id = resolve(tracker.session(), &name)?;
            let removed = tracker.mutate(|s| s.remove_combatant(id)).await;
            match removed {
                Some(c) => format!("Removed {}", c.name),
                None => format!("no combatant named '{name}'"),
            }
        }
        Command::Damage {
            target,
            amount,
            attacker,
        } => {
            let target = resolve(tracker.session(), &target)?;
            let attacker = attacker
                .map(|name| resolve(tracker.session(), &name))
                .transpose()?;
            tracker
                .mutate(|s| s.apply_damage(target, amount, attacker))
                .await;
            describe(tracker.session(), target)
        }
        Command::Heal { target, amount } => {
            let target = resolve(tracker.session(), &target)?;
            tracker.mutate(|s| s.heal(target, amount)).await;
            describe(tracker.session(), target)
        }
        Command::Stamina { target, delta } => {
            let target = resolve(tracker.session(), &target)?;
            tracker.mutate(|s| s.adjust_stamina(target, delta)).await;
            describe(tracker.session(), target)
        }
        Command::SetHealth { target, health } => {
            let target = resolve(tracker.session(), &target)?;
            let patch = CombatantPatch {
                health: Some(health),
                ..CombatantPatch::default()
            };
            tracker.mutate(|s| s.update_combatant(target, patch)).await;
            describe(tracker.session(), target)
        }
        Command::Initiative { target, value } => {
            let target = resolve(tracker.session(), &target)?;
            let patch = CombatantPatch {
                initiative: Some(value),
                ..CombatantPatch::default()
            };
            tracker.mutate(|s| s.update_combatant(target, patch)).await;
            describe(tracker.session(), target)
        }
        Command::Revive(name) => {
            let id = resolve(tracker.session(), &name)?;
            let down = tracker
                .session()
                .combatant(id)
                .is_some_and(|c| c.status.is_down());
            if !down {
                return Err(format!("{name} is not down"));
            }
            tracker.mutate(|s| s.revive_combatant(id)).await;
            describe(tracker.session(), id)
        }
        Command::Start => {
            if tracker.session().combatants().is_empty() {
                return Err("add combatants before starting".to_string());
            }
            tracker.mutate(|s| s.start()).await;
            format!("Combat started. {}", render::turn(tracker.session()))
        }
        Command::Next => {
            let outcome = tracker.mutate(|s| s.advance_turn()).await;
            let session = tracker.session();
            let mut out = String::new();
            for id in &outcome.deaths {
                if let Some(c) = session.combatant(*id) {
                    out.push_str(&format!("{} has died.\n", c.name.red()));
                }
            }
            if outcome.new_round {
                out.push_str(&format!("{} {}\n", "New round:".bold(), outcome.round));
            }
            out.push_str(&render::turn(session));
            out
        }
        Command::Reset => {
            tracker.mutate(|s| s.reset()).await;
            "Combat reset: everyone restored, back to round 1.".to_string()
        }
        Command::Clear => {
            tracker.mutate(|s| s.clear()).await;
            "Roster cleared.".to_string()
        }
        Command::End => {
            tracker.mutate(|s| s.end()).await;
            tracker.session().summary().to_string()
        }
        Command::Dismiss => {
            tracker.mutate(|s| s.dismiss_report()).await;
            "Report dismissed.".to_string()
        }
        Command::Status => render::status(tracker.session()),
        Command::Log { markdown: false } => render::log(tracker.session()),
        Command::Log { markdown: true } => tracker.session().log().export_markdown(),
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(output)
}
