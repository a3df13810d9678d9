pub mod panel;
pub mod replay;
pub mod settings;

use std::path::{Path, PathBuf};

use sync_token_core::settings_file::SettingsFile;
use sync_token_core::{InMemorySettings, InMemoryHost, WorldState};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Settings from `path`, or the registered defaults when no file is given
pub fn load_settings(path: Option<&PathBuf>) -> Result<InMemorySettings, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(SettingsFile::load(path)?.into_settings()?),
        None => Ok(InMemorySettings::new()),
    }
}

pub fn load_world(path: &Path) -> Result<InMemoryHost, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read world {}: {}", path.display(), e))?;
    let world: WorldState = serde_json::from_str(&text)
        .map_err(|e| format!("invalid world {}: {}", path.display(), e))?;
    Ok(InMemoryHost::new(world))
}
