//! View-model for the actor sheet sync panel
//!
//! Rendering and click wiring belong to the host UI; this only decides what
//! the panel shows.

use crate::model::Actor;
use crate::policy::{read_bool, read_panel_position, PanelPosition, SettingKey, SettingsStore};

/// Image the host shows for a token without a texture
pub const DEFAULT_TOKEN_IMAGE: &str = "icons/svg/mystery-man.svg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub position: PanelPosition,
    /// Prototype token image, or the host default when unset
    pub token_image: String,
    /// Actor portrait and token image differ
    pub has_diff: bool,
    pub force_sync: bool,
}

impl PanelView {
    /// Panel contents for `actor`, or `None` when the panel is switched off
    pub fn for_actor(actor: &Actor, settings: &dyn SettingsStore, force_sync: bool) -> Option<Self> {
        if !read_bool(settings, SettingKey::PanelEnabled) {
            return None;
        }
        let token_image = match actor.prototype_token.texture.src.as_str() {
            "" => DEFAULT_TOKEN_IMAGE.to_string(),
            src => src.to_string(),
        };
        Some(Self {
            position: read_panel_position(settings),
            has_diff: actor.img != token_image,
            token_image,
            force_sync,
        })
    }

    /// CSS classes the host panel template expects
    pub fn css_classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["sync-token-panel", self.position.as_str()];
        if self.has_diff {
            classes.push("has-diff");
        }
        if self.force_sync {
            classes.push("force-sync");
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{InMemorySettings, SettingValue};

    #[test]
    fn test_disabled_panel_renders_nothing() {
        let settings = InMemorySettings::new().with(SettingKey::PanelEnabled, false);
        let actor = Actor::new("a1", "Bob", "bob.png");
        assert!(PanelView::for_actor(&actor, &settings, false).is_none());
    }

    #[test]
    fn test_matching_images_have_no_diff() {
        let actor = Actor::new("a1", "Bob", "bob.png");
        let view = PanelView::for_actor(&actor, &InMemorySettings::new(), false).unwrap();

        assert!(!view.has_diff);
        assert_eq!(view.position, PanelPosition::BottomLeft);
        assert_eq!(view.css_classes(), vec!["sync-token-panel", "bottom-left"]);
    }

    #[test]
    fn test_empty_texture_uses_default_image() {
        let mut actor = Actor::new("a1", "Bob", "bob.png");
        actor.prototype_token.texture.src.clear();
        let mut settings = InMemorySettings::new();
        settings
            .set(
                SettingKey::PanelPosition,
                SettingValue::Choice("top-left".to_string()),
            )
            .unwrap();

        let view = PanelView::for_actor(&actor, &settings, true).unwrap();

        assert_eq!(view.token_image, DEFAULT_TOKEN_IMAGE);
        assert!(view.has_diff);
        assert_eq!(
            view.css_classes(),
            vec!["sync-token-panel", "top-left", "has-diff", "force-sync"]
        );
    }
}
