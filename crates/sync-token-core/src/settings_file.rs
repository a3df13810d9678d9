//! Settings file loading
//!
//! ```toml
//! [world]
//! autoNameSync = true
//! disableTokenRing = false
//!
//! [client]
//! panelPosition = "top-right"
//! ```
//!
//! Missing keys keep their registered defaults. Unknown keys are rejected.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{Result, SyncError};
use crate::policy::{InMemorySettings, PanelPosition, SettingKey, SettingValue, SettingsStore};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub client: ClientSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorldSection {
    pub auto_name_sync: Option<bool>,
    pub sync_scene_tokens: Option<bool>,
    pub auto_image_sync: Option<bool>,
    pub disable_token_ring: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientSection {
    pub panel_enabled: Option<bool>,
    pub panel_position: Option<PanelPosition>,
}

impl SettingsFile {
    /// Parse TOML text
    ///
    /// # Errors
    ///
    /// Returns `Config` on malformed TOML, unknown keys or bad values.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Read and parse a file
    ///
    /// # Errors
    ///
    /// Returns `Config` when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// Registered defaults overlaid with the values in this file
    ///
    /// # Errors
    ///
    /// Propagates `InvalidSetting` from the registry.
    pub fn into_settings(self) -> Result<InMemorySettings> {
        let mut settings = InMemorySettings::new();
        let bools = [
            (SettingKey::AutoNameSync, self.world.auto_name_sync),
            (SettingKey::SyncSceneTokens, self.world.sync_scene_tokens),
            (SettingKey::AutoImageSync, self.world.auto_image_sync),
            (SettingKey::DisableTokenRing, self.world.disable_token_ring),
            (SettingKey::PanelEnabled, self.client.panel_enabled),
        ];
        for (key, value) in bools {
            if let Some(value) = value {
                settings.set(key, SettingValue::Bool(value))?;
            }
        }
        if let Some(position) = self.client.panel_position {
            settings.set(
                SettingKey::PanelPosition,
                SettingValue::Choice(position.as_str().to_string()),
            )?;
        }
        Ok(settings)
    }
}
