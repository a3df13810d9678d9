//! Panel command
//!
//! Usage: sync-token panel --world <world.json> --actor <id> [--settings <file>]

use std::path::PathBuf;

use clap::Args;
use sync_token_core::panel::PanelView;
use sync_token_core::{flags, DocumentHost};

use super::{load_settings, load_world, CliResult};

#[derive(Debug, Args)]
pub struct PanelArgs {
    /// World snapshot (JSON)
    #[arg(long)]
    pub world: PathBuf,

    /// Actor whose sheet the panel belongs to
    #[arg(long)]
    pub actor: String,

    /// Settings file (TOML); registered defaults when omitted
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

pub fn execute(args: PanelArgs) -> CliResult {
    let host = load_world(&args.world)?;
    let settings = load_settings(args.settings.as_ref())?;
    let actor = host
        .actor(&args.actor)
        .ok_or_else(|| format!("unknown actor {}", args.actor))?;

    let force_sync = flags::read_override(&host, &actor);
    match PanelView::for_actor(&actor, &settings, force_sync) {
        Some(view) => {
            println!("token image: {}", view.token_image);
            println!("classes: {}", view.css_classes().join(" "));
        }
        None => println!("panel disabled"),
    }
    Ok(())
}
