use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A host update document: dotted property paths to new values
///
/// This is the shape the host's `update` calls accept, e.g.
/// `{"prototypeToken.texture.src": "a.png", "flags.sync-token-actor.alwaysSync": true}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentUpdate(BTreeMap<String, Value>);

impl DocumentUpdate {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, path: impl Into<String>, value: Value) {
        self.0.insert(path.into(), value);
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    pub fn contains_key(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Expand every dotted path into `target`, creating objects on the way
    ///
    /// Non-object intermediate values are replaced by objects, matching how
    /// the host merges update documents.
    pub fn apply_to(&self, target: &mut Value) {
        for (path, value) in &self.0 {
            let segments: Vec<&str> = path.split('.').collect();
            set_path(target, &segments, value.clone());
        }
    }
}

fn set_path(target: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        set_path(child, rest, value);
    }
}

impl FromIterator<(String, Value)> for DocumentUpdate {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
