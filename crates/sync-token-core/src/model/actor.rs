use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::token::TokenFields;

/// Actor - the canonical character/creature record
///
/// Only the identity fields (`name`, `img`), the prototype token and the
/// namespaced flags are modelled; everything else an actor carries on the
/// host is irrelevant to token sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,

    /// Display name
    pub name: String,

    /// Portrait image source
    pub img: String,

    /// Default token appearance for new placements
    pub prototype_token: TokenFields,

    /// Namespaced flags: `namespace -> key -> value`
    #[serde(default)]
    pub flags: Map<String, Value>,

    /// Set when this actor is the synthetic actor of an unlinked token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

impl Actor {
    /// Create an actor whose prototype token mirrors its name and image
    pub fn new(id: impl Into<String>, name: impl Into<String>, img: impl Into<String>) -> Self {
        let name = name.into();
        let img = img.into();
        Self {
            id: id.into(),
            prototype_token: TokenFields::new(name.clone(), img.clone()),
            name,
            img,
            flags: Map::new(),
            token_id: None,
        }
    }

    /// True when this actor stands in for a single unlinked token
    pub fn is_token(&self) -> bool {
        self.token_id.is_some()
    }

    /// Raw flag lookup straight from the `flags` field
    pub fn raw_flag(&self, namespace: &str, key: &str) -> Option<&Value> {
        self.flags.get(namespace)?.get(key)
    }

    /// Set a flag directly on this in-memory snapshot
    pub fn set_raw_flag(&mut self, namespace: &str, key: &str, value: Value) {
        let scope = self
            .flags
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !scope.is_object() {
            *scope = Value::Object(Map::new());
        }
        if let Value::Object(map) = scope {
            map.insert(key.to_string(), value);
        }
    }
}

/// Document ownership levels, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OwnershipLevel {
    None,
    Limited,
    Observer,
    Owner,
}

impl OwnershipLevel {
    /// Whether this level grants at least `required`
    pub fn satisfies(self, required: OwnershipLevel) -> bool {
        self >= required
    }
}
