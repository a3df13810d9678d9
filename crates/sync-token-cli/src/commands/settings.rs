//! Settings command
//!
//! Usage: sync-token settings [--settings <file>]

use std::path::PathBuf;

use clap::Args;
use sync_token_core::policy::{SettingScope, SettingValue};
use sync_token_core::{SettingKey, SettingsStore};

use super::{load_settings, CliResult};

#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Settings file (TOML); registered defaults when omitted
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

pub fn execute(args: SettingsArgs) -> CliResult {
    let settings = load_settings(args.settings.as_ref())?;
    for line in render(&settings) {
        println!("{}", line);
    }
    Ok(())
}

/// One `scope.key = value` line per registered setting
pub fn render(settings: &dyn SettingsStore) -> Vec<String> {
    SettingKey::ALL
        .iter()
        .map(|key| {
            let scope = match key.scope() {
                SettingScope::World => "world",
                SettingScope::Client => "client",
            };
            let value = match settings.get(*key).unwrap_or_else(|| key.default_value()) {
                SettingValue::Bool(b) => b.to_string(),
                SettingValue::Choice(c) => format!("\"{}\"", c),
            };
            format!("{}.{} = {}", scope, key, value)
        })
        .collect()
}
