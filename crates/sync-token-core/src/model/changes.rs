use serde_json::Value;

/// Identity fields carried by an actor-changed notification
///
/// Built from the host's raw change payload. A field is present only when
/// the payload carries it as a JSON string; anything else (missing, null,
/// a number, an object) is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorChanges {
    pub name: Option<String>,
    pub img: Option<String>,
}

impl ActorChanges {
    /// Extract identity changes from a host change payload
    pub fn from_payload(payload: &Value) -> Self {
        let string_field = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            name: string_field("name"),
            img: string_field("img"),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_img(mut self, img: impl Into<String>) -> Self {
        self.img = Some(img.into());
        self
    }

    /// True when the change touches the actor's name or image
    pub fn touches_identity(&self) -> bool {
        self.name.is_some() || self.img.is_some()
    }
}
