//! sync-token CLI
//!
//! Offline driver for the sync core: replays host notifications against a
//! world snapshot and inspects effective settings.

use clap::{Parser, Subcommand};
use sync_token_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sync-token")]
#[command(about = "sync-token - keep token identity in step with its actor", long_about = None)]
struct Cli {
    /// Emit logs as JSON instead of human-readable lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay an event log against a world snapshot
    Replay(commands::replay::ReplayArgs),
    /// Print the effective settings
    Settings(commands::settings::SettingsArgs),
    /// Show the sync panel state for one actor
    Panel(commands::panel::PanelArgs),
}

fn main() {
    let cli = Cli::parse();

    logging_facility::init(if cli.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Replay(args) => commands::replay::execute(args),
        Commands::Settings(args) => commands::settings::execute(args),
        Commands::Panel(args) => commands::panel::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
