use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::Mutex;

use sk_combat::{CombatSession, LocalStore, SyncedTracker};

use crate::console;

pub async fn run(config: Option<&Path>) -> Result<(), String> {
    let config = super::load_config(config)?;
    let tracker = SyncedTracker::new(CombatSession::new(config), LocalStore);

    println!("  {} local combat", "Starting".bold());
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    console::run(Arc::new(Mutex::new(tracker))).await
}
