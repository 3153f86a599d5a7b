use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use sk_combat::{AuthToken, CombatSession, RoomCode, RoomStore, StaticToken, SyncedTracker, spawn_poller};

use crate::console;
use crate::file_backend::FileRoomBackend;

pub async fn run(
    code: &str,
    dir: &Path,
    poll_ms: Option<u64>,
    token: &str,
    config: Option<&Path>,
) -> Result<(), String> {
    let mut config = super::load_config(config)?;
    if let Some(ms) = poll_ms {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }
    let room = RoomCode::parse(code).map_err(|e| e.to_string())?;
    if !dir.is_dir() {
        return Err(format!("{} is not a directory", dir.display()));
    }

    let interval = config.poll_interval();
    let store = RoomStore::new(
        FileRoomBackend::new(dir),
        StaticToken(AuthToken::new(token)),
        room.clone(),
    );
    let tracker = SyncedTracker::connect(CombatSession::new(config), store).await;
    info!(%room, dir = %dir.display(), version = tracker.version(), "joined room");

    println!("  {} room {}", "Joined".bold(), room.to_string().cyan());
    println!(
        "  {} combatant(s), polling every {} ms",
        tracker.session().combatants().len(),
        interval.as_millis()
    );
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    let tracker = Arc::new(Mutex::new(tracker));
    let poller = spawn_poller(Arc::clone(&tracker), interval);
    let result = console::run(Arc::clone(&tracker)).await;
    poller.abort();
    if tracker.lock().await.has_unsent_changes() {
        warn!(%room, "leaving with changes the room never received");
    }
    result
}
