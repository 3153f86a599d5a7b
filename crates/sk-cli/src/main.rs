//! CLI frontend for the Skirmish combat tracker.

mod commands;
mod console;
mod file_backend;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sk",
    about = "Skirmish: a combat tracker for tabletop sessions",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a combat session on this machine only
    Play {
        /// JSON file with tracker settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Join a shared room kept as a JSON file in a directory
    Room {
        /// Room code (letters and digits)
        code: String,

        /// Directory holding the room files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Poll interval in milliseconds (overrides the config)
        #[arg(long)]
        poll_ms: Option<u64>,

        /// Bearer token passed to the room storage
        #[arg(long, default_value = "local-player")]
        token: String,

        /// JSON file with tracker settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play { config } => commands::play::run(config.as_deref()).await,
        Commands::Room {
            code,
            dir,
            poll_ms,
            token,
            config,
        } => commands::room::run(&code, &dir, poll_ms, &token, config.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
