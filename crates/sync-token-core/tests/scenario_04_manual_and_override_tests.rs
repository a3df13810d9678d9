#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{rename, service, WorldBuilder, USER};
use serde_json::json;
use sync_token_core::flags::ALWAYS_SYNC;
use sync_token_core::host::{WriteKind, WriteRecord};
use sync_token_core::model::OwnershipLevel;
use sync_token_core::policy::MODULE_ID;
use sync_token_core::{
    Actor, DocumentHost, InMemorySettings, SettingKey, SkipReason, SyncOutcome, TokenDocument,
    TokenFields,
};

fn all_off() -> InMemorySettings {
    InMemorySettings::new()
        .with(SettingKey::AutoNameSync, false)
        .with(SettingKey::AutoImageSync, false)
}

fn synthetic_actor() -> Actor {
    let mut actor = Actor::new("actor-a", "Bob", "bob.png");
    actor.token_id = Some("token-u".to_string());
    actor
}

#[tokio::test]
async fn test_synthetic_actor_mirrors_onto_its_token_regardless_of_toggles() {
    let host = WorldBuilder::new()
        .actor(synthetic_actor())
        .token(
            TokenDocument::new("token-u", "actor-a", TokenFields::new("Bob", "bob.png"))
                .unlinked(),
        )
        .build();
    let service = service(&host, all_off());

    let report = rename(&service, &host, "actor-a", "Bobby").await.report().unwrap();

    assert_eq!(report.writes, 1);
    match &host.writes()[0] {
        WriteRecord::Token { token_id, update } => {
            assert_eq!(token_id, "token-u");
            assert_eq!(update.get("name"), Some(&json!("Bobby")));
            assert_eq!(update.len(), 1);
        }
        other => panic!("expected direct token update, got {:?}", other),
    }
    assert_eq!(host.actor("actor-a").unwrap().prototype_token.name, "Bob");
}

#[tokio::test]
async fn test_mirrored_token_is_not_written_again_by_scene_batch() {
    let host = WorldBuilder::new()
        .actor(synthetic_actor())
        .token(
            TokenDocument::new("token-u", "actor-a", TokenFields::new("Bob", "bob.png"))
                .unlinked(),
        )
        .build();
    let service = service(&host, InMemorySettings::new());

    let report = rename(&service, &host, "actor-a", "Bobby").await.report().unwrap();

    // mirror + prototype; the scene batch finds nothing left to change
    assert_eq!(report.writes, 2);
    assert!(host
        .writes()
        .iter()
        .all(|w| !matches!(w, WriteRecord::EmbeddedTokens { .. })));
}

#[tokio::test]
async fn test_sync_image_now_ignores_image_toggle() {
    let mut actor = Actor::new("actor-a", "Bob", "new.png");
    actor.prototype_token.texture.src = "old.png".to_string();
    let host = WorldBuilder::new()
        .actor(actor.clone())
        .token(TokenDocument::new(
            "token-1",
            "actor-a",
            TokenFields::new("Bob", "old.png"),
        ))
        .build();
    let service = service(&host, all_off());

    let report = service.sync_image_now(&actor).await.report().unwrap();

    assert_eq!(report.writes, 2);
    assert_eq!(
        host.actor("actor-a").unwrap().prototype_token.texture.src,
        "new.png"
    );
    assert_eq!(host.token("token-1").unwrap().fields.texture.src, "new.png");
}

#[tokio::test]
async fn test_sync_image_now_requires_ownership() {
    let mut actor = Actor::new("actor-a", "Bob", "new.png");
    actor.prototype_token.texture.src = "old.png".to_string();
    let host = WorldBuilder::new()
        .actor_with_level(actor.clone(), USER, OwnershipLevel::Limited)
        .build();
    let service = service(&host, InMemorySettings::new());

    assert_eq!(
        service.sync_image_now(&actor).await,
        SyncOutcome::Skipped(SkipReason::NotOwner)
    );
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn test_toggle_force_sync_flips_and_persists() {
    let host = WorldBuilder::new()
        .actor(Actor::new("actor-a", "Bob", "bob.png"))
        .build();
    let service = service(&host, InMemorySettings::new());
    let actor = host.actor("actor-a").unwrap();

    assert!(service.toggle_force_sync(&actor).await);
    assert!(service.force_sync(&host.actor("actor-a").unwrap()));
    assert!(matches!(&host.writes()[0], WriteRecord::Flag { key, value, .. }
        if key == ALWAYS_SYNC && *value == json!(true)));

    // a stale snapshot still toggles from the live value
    assert!(!service.toggle_force_sync(&actor).await);
    assert!(!service.force_sync(&host.actor("actor-a").unwrap()));
}

#[tokio::test]
async fn test_toggle_falls_back_to_direct_update_when_flag_api_fails() {
    let host = WorldBuilder::new()
        .actor(Actor::new("actor-a", "Bob", "bob.png"))
        .build();
    host.fail(WriteKind::SetFlag);
    let service = service(&host, InMemorySettings::new());
    let actor = host.actor("actor-a").unwrap();

    assert!(service.toggle_force_sync(&actor).await);

    match &host.writes()[0] {
        WriteRecord::Actor { update, .. } => {
            assert_eq!(
                update.get(&format!("flags.{MODULE_ID}.{ALWAYS_SYNC}")),
                Some(&json!(true))
            );
        }
        other => panic!("expected fallback actor update, got {:?}", other),
    }
    assert!(service.force_sync(&host.actor("actor-a").unwrap()));
}

#[tokio::test]
async fn test_toggle_reports_unchanged_value_when_nothing_persists() {
    let host = WorldBuilder::new()
        .actor(Actor::new("actor-a", "Bob", "bob.png"))
        .build();
    host.fail(WriteKind::SetFlag);
    host.fail(WriteKind::Actor);
    let service = service(&host, InMemorySettings::new());
    let actor = host.actor("actor-a").unwrap();

    assert!(!service.toggle_force_sync(&actor).await);
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn test_override_propagates_with_toggles_off() {
    let host = WorldBuilder::new()
        .actor(Actor::new("actor-a", "Bob", "bob.png"))
        .token(TokenDocument::new(
            "token-1",
            "actor-a",
            TokenFields::new("Bob", "bob.png").with_ring(true),
        ))
        .build();
    let service = service(&host, all_off());
    service
        .toggle_force_sync(&host.actor("actor-a").unwrap())
        .await;
    host.clear_writes();

    rename(&service, &host, "actor-a", "Bobby").await;

    let token = host.token("token-1").unwrap();
    assert_eq!(token.fields.name, "Bobby");
    assert_eq!(host.actor("actor-a").unwrap().prototype_token.name, "Bobby");
}

#[tokio::test]
async fn test_unreadable_flag_scope_falls_back_to_raw_field() {
    let mut actor = Actor::new("actor-a", "Bob", "bob.png");
    actor.set_raw_flag(MODULE_ID, ALWAYS_SYNC, json!(true));
    let host = WorldBuilder::new().actor(actor).build();
    host.fail(WriteKind::GetFlag);
    let service = service(&host, InMemorySettings::new());

    assert!(service.force_sync(&host.actor("actor-a").unwrap()));
}
