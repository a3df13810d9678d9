//! Settings registry and the policy snapshot derived from it
//!
//! The host's settings registry is reached through the `SettingsStore`
//! trait so that the engine never touches global state. `Policy::read`
//! takes a fresh snapshot on every decision; nothing is cached.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SyncError};

/// Namespace under which settings and flags are registered on the host
pub const MODULE_ID: &str = "sync-token-actor";

/// Where a setting is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingScope {
    /// Shared by every user of the world
    World,
    /// Per user, per client
    Client,
}

/// Every setting this module registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    AutoNameSync,
    SyncSceneTokens,
    AutoImageSync,
    DisableTokenRing,
    PanelEnabled,
    PanelPosition,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::AutoNameSync,
        SettingKey::SyncSceneTokens,
        SettingKey::AutoImageSync,
        SettingKey::DisableTokenRing,
        SettingKey::PanelEnabled,
        SettingKey::PanelPosition,
    ];

    /// Key as registered on the host
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::AutoNameSync => "autoNameSync",
            SettingKey::SyncSceneTokens => "syncSceneTokens",
            SettingKey::AutoImageSync => "autoImageSync",
            SettingKey::DisableTokenRing => "disableTokenRing",
            SettingKey::PanelEnabled => "panelEnabled",
            SettingKey::PanelPosition => "panelPosition",
        }
    }

    pub fn scope(&self) -> SettingScope {
        match self {
            SettingKey::PanelEnabled | SettingKey::PanelPosition => SettingScope::Client,
            _ => SettingScope::World,
        }
    }

    pub fn default_value(&self) -> SettingValue {
        match self {
            SettingKey::AutoNameSync
            | SettingKey::SyncSceneTokens
            | SettingKey::AutoImageSync
            | SettingKey::PanelEnabled => SettingValue::Bool(true),
            SettingKey::DisableTokenRing => SettingValue::Bool(false),
            SettingKey::PanelPosition => {
                SettingValue::Choice(PanelPosition::default().as_str().to_string())
            }
        }
    }

    /// Check that `value` has the right shape for this key
    ///
    /// # Errors
    ///
    /// Returns `InvalidSetting` on a type mismatch or an unknown choice.
    pub fn validate(&self, value: &SettingValue) -> Result<()> {
        match (self, value) {
            (SettingKey::PanelPosition, SettingValue::Choice(choice)) => {
                choice.parse::<PanelPosition>().map(|_| ())
            }
            (SettingKey::PanelPosition, SettingValue::Bool(_)) => Err(SyncError::InvalidSetting {
                key: self.as_str().to_string(),
                reason: "expected one of the panel position choices".to_string(),
            }),
            (_, SettingValue::Bool(_)) => Ok(()),
            (_, SettingValue::Choice(_)) => Err(SyncError::InvalidSetting {
                key: self.as_str().to_string(),
                reason: "expected a boolean".to_string(),
            }),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SyncError::InvalidSetting {
                key: s.to_string(),
                reason: "unknown setting".to_string(),
            })
    }
}

/// A stored setting value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Choice(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Choice(_) => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            SettingValue::Choice(s) => Some(s),
            SettingValue::Bool(_) => None,
        }
    }
}

/// Corner of the actor sheet portrait the panel is pinned to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelPosition {
    #[default]
    BottomLeft,
    BottomRight,
    TopRight,
    TopLeft,
}

impl PanelPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelPosition::BottomLeft => "bottom-left",
            PanelPosition::BottomRight => "bottom-right",
            PanelPosition::TopRight => "top-right",
            PanelPosition::TopLeft => "top-left",
        }
    }
}

impl FromStr for PanelPosition {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bottom-left" => Ok(PanelPosition::BottomLeft),
            "bottom-right" => Ok(PanelPosition::BottomRight),
            "top-right" => Ok(PanelPosition::TopRight),
            "top-left" => Ok(PanelPosition::TopLeft),
            other => Err(SyncError::InvalidSetting {
                key: SettingKey::PanelPosition.as_str().to_string(),
                reason: format!("unknown panel position '{}'", other),
            }),
        }
    }
}

/// Access to the host settings registry
pub trait SettingsStore: Send + Sync {
    /// Current value, or `None` if the key has never been registered
    fn get(&self, key: SettingKey) -> Option<SettingValue>;

    /// Persist a new value
    ///
    /// # Errors
    ///
    /// Returns `InvalidSetting` if the value does not fit the key.
    fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<()>;
}

/// In-memory settings registry, pre-populated with the registered defaults
#[derive(Debug, Clone)]
pub struct InMemorySettings {
    values: HashMap<SettingKey, SettingValue>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        let values = SettingKey::ALL
            .into_iter()
            .map(|key| (key, key.default_value()))
            .collect();
        Self { values }
    }

    /// Registry with nothing registered; every read falls back to defaults
    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Builder-style boolean override, for tests and fixtures
    pub fn with(mut self, key: SettingKey, value: bool) -> Self {
        self.values.insert(key, SettingValue::Bool(value));
        self
    }

    /// Store a value without validating it, as a misbehaving host might
    pub fn insert_unchecked(&mut self, key: SettingKey, value: SettingValue) {
        self.values.insert(key, value);
    }
}

impl Default for InMemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for InMemorySettings {
    fn get(&self, key: SettingKey) -> Option<SettingValue> {
        self.values.get(&key).cloned()
    }

    fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<()> {
        key.validate(&value)?;
        self.values.insert(key, value);
        Ok(())
    }
}

/// Snapshot of the sync toggles at decision time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub auto_name_sync: bool,
    pub sync_scene_tokens: bool,
    pub auto_image_sync: bool,
    pub disable_token_ring: bool,
}

impl Policy {
    /// Read every sync toggle from `store`
    ///
    /// A missing or non-boolean value falls back to the registered default.
    pub fn read(store: &dyn SettingsStore) -> Self {
        Self {
            auto_name_sync: read_bool(store, SettingKey::AutoNameSync),
            sync_scene_tokens: read_bool(store, SettingKey::SyncSceneTokens),
            auto_image_sync: read_bool(store, SettingKey::AutoImageSync),
            disable_token_ring: read_bool(store, SettingKey::DisableTokenRing),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::read(&InMemorySettings::new())
    }
}

/// Boolean setting with default fallback
pub fn read_bool(store: &dyn SettingsStore, key: SettingKey) -> bool {
    let default = key.default_value().as_bool().unwrap_or(false);
    match store.get(key) {
        Some(SettingValue::Bool(value)) => value,
        Some(other) => {
            tracing::warn!(setting = key.as_str(), value = ?other, "non-boolean setting, using default");
            default
        }
        None => default,
    }
}

/// Panel position with default fallback
pub fn read_panel_position(store: &dyn SettingsStore) -> PanelPosition {
    match store.get(SettingKey::PanelPosition) {
        Some(SettingValue::Choice(choice)) => choice.parse().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "invalid panel position, using default");
            PanelPosition::default()
        }),
        Some(other) => {
            tracing::warn!(value = ?other, "non-choice panel position, using default");
            PanelPosition::default()
        }
        None => PanelPosition::default(),
    }
}
