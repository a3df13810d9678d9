use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::update::DocumentUpdate;

/// Update-document key for the token name
pub const KEY_NAME: &str = "name";
/// Update-document key for the token image
pub const KEY_TEXTURE_SRC: &str = "texture.src";
/// Update-document key for the ring toggle
pub const KEY_RING_ENABLED: &str = "ring.enabled";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureData {
    #[serde(default)]
    pub src: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingData {
    #[serde(default)]
    pub enabled: bool,
}

/// The three synced token fields, shaped the way the host stores them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub texture: TextureData,
    #[serde(default)]
    pub ring: RingData,
}

impl TokenFields {
    pub fn new(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: TextureData { src: src.into() },
            ring: RingData::default(),
        }
    }

    pub fn with_ring(mut self, enabled: bool) -> Self {
        self.ring.enabled = enabled;
        self
    }
}

/// A placed token instance on a scene (or a token pending creation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDocument {
    pub id: String,

    /// Actor this token represents, if any
    #[serde(default)]
    pub actor_id: Option<String>,

    /// Linked tokens derive their data from the actor live
    #[serde(default = "default_actor_link")]
    pub actor_link: bool,

    #[serde(flatten)]
    pub fields: TokenFields,
}

fn default_actor_link() -> bool {
    true
}

impl TokenDocument {
    pub fn new(id: impl Into<String>, actor_id: impl Into<String>, fields: TokenFields) -> Self {
        Self {
            id: id.into(),
            actor_id: Some(actor_id.into()),
            actor_link: true,
            fields,
        }
    }

    /// Mark this token as holding its own copy of the actor data
    pub fn unlinked(mut self) -> Self {
        self.actor_link = false;
        self
    }

    pub fn references(&self, actor_id: &str) -> bool {
        self.actor_id.as_deref() == Some(actor_id)
    }
}

/// Field-level patch against a token representation
///
/// `None` means "leave the field alone". Patches are always diffed against
/// the target before a write so that a patch reaching the host never
/// restates a value the target already holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPatch {
    pub name: Option<String>,
    pub texture_src: Option<String>,
    pub ring_enabled: Option<bool>,
}

impl TokenPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.texture_src.is_none() && self.ring_enabled.is_none()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn texture_src(mut self, src: impl Into<String>) -> Self {
        self.texture_src = Some(src.into());
        self
    }

    pub fn ring_enabled(mut self, enabled: bool) -> Self {
        self.ring_enabled = Some(enabled);
        self
    }

    /// Keep only the fields whose target value differs from `current`
    pub fn diff(&self, current: &TokenFields) -> TokenPatch {
        TokenPatch {
            name: self.name.clone().filter(|n| *n != current.name),
            texture_src: self
                .texture_src
                .clone()
                .filter(|src| *src != current.texture.src),
            ring_enabled: self.ring_enabled.filter(|e| *e != current.ring.enabled),
        }
    }

    /// Write the patch into `fields` in place
    pub fn apply_to(&self, fields: &mut TokenFields) {
        if let Some(name) = &self.name {
            fields.name = name.clone();
        }
        if let Some(src) = &self.texture_src {
            fields.texture.src = src.clone();
        }
        if let Some(enabled) = self.ring_enabled {
            fields.ring.enabled = enabled;
        }
    }

    /// Render as a host update document, each key prefixed with `prefix`
    ///
    /// ```
    /// use sync_token_core::model::TokenPatch;
    ///
    /// let update = TokenPatch::default().ring_enabled(false).to_update("prototypeToken.");
    /// assert!(update.contains_key("prototypeToken.ring.enabled"));
    /// ```
    pub fn to_update(&self, prefix: &str) -> DocumentUpdate {
        let mut update = DocumentUpdate::new();
        if let Some(name) = &self.name {
            update.set(format!("{prefix}{KEY_NAME}"), Value::String(name.clone()));
        }
        if let Some(src) = &self.texture_src {
            update.set(format!("{prefix}{KEY_TEXTURE_SRC}"), Value::String(src.clone()));
        }
        if let Some(enabled) = self.ring_enabled {
            update.set(format!("{prefix}{KEY_RING_ENABLED}"), Value::Bool(enabled));
        }
        update
    }
}
