#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{change_actor, service, WorldBuilder, SCENE};
use serde_json::json;
use sync_token_core::host::WriteRecord;
use sync_token_core::model::{KEY_RING_ENABLED, KEY_TEXTURE_SRC};
use sync_token_core::{
    Actor, DocumentHost, InMemorySettings, SettingKey, SkipReason, SyncOutcome, TokenDocument,
    TokenFields,
};

fn ringed_actor() -> Actor {
    let mut actor = Actor::new("actor-a", "Bob", "bob.png");
    actor.prototype_token.ring.enabled = true;
    actor
}

fn ringed_world() -> WorldBuilder {
    WorldBuilder::new().actor(ringed_actor()).token(TokenDocument::new(
        "token-1",
        "actor-a",
        TokenFields::new("Bob", "bob.png").with_ring(true),
    ))
}

#[tokio::test]
async fn test_ring_disable_with_unchanged_image_writes_ring_only() {
    // Scenario: ring disabling on, image "changed" to the value it already has
    // Then: prototype and token get ring.enabled = false and no texture key
    let host = ringed_world().build();
    let service = service(
        &host,
        InMemorySettings::new().with(SettingKey::DisableTokenRing, true),
    );

    let report = change_actor(&service, &host, "actor-a", json!({ "img": "bob.png" }))
        .await
        .report()
        .unwrap();

    assert_eq!(report.writes, 2);
    let writes = host.writes();
    assert_eq!(writes.len(), 2);
    match &writes[0] {
        WriteRecord::Actor { update, .. } => {
            assert_eq!(update.get("prototypeToken.ring.enabled"), Some(&json!(false)));
            assert!(!update.contains_key("prototypeToken.texture.src"));
        }
        other => panic!("expected prototype update, got {:?}", other),
    }
    match &writes[1] {
        WriteRecord::EmbeddedTokens { scene_id, updates } => {
            assert_eq!(scene_id, SCENE);
            assert_eq!(updates.len(), 1);
            assert_eq!(updates[0].update.get(KEY_RING_ENABLED), Some(&json!(false)));
            assert!(!updates[0].update.contains_key(KEY_TEXTURE_SRC));
        }
        other => panic!("expected scene batch, got {:?}", other),
    }

    assert!(!host.actor("actor-a").unwrap().prototype_token.ring.enabled);
    let token = host.token("token-1").unwrap();
    assert!(!token.fields.ring.enabled);
    assert_eq!(token.fields.texture.src, "bob.png");
}

#[tokio::test]
async fn test_image_change_propagates_texture() {
    let host = ringed_world().build();
    let service = service(&host, InMemorySettings::new());

    let report = change_actor(&service, &host, "actor-a", json!({ "img": "new.png" }))
        .await
        .report()
        .unwrap();

    assert_eq!(report.writes, 2);
    assert_eq!(report.tokens_touched, 1);
    let actor = host.actor("actor-a").unwrap();
    assert_eq!(actor.prototype_token.texture.src, "new.png");
    assert!(actor.prototype_token.ring.enabled, "ring untouched without ring disabling");
    let token = host.token("token-1").unwrap();
    assert_eq!(token.fields.texture.src, "new.png");
    assert!(token.fields.ring.enabled);
}

#[tokio::test]
async fn test_unchanged_image_without_ring_disable_short_circuits() {
    let host = ringed_world().build();
    let service = service(&host, InMemorySettings::new());

    let outcome = change_actor(&service, &host, "actor-a", json!({ "img": "bob.png" })).await;

    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::NothingToDo));
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn test_image_toggle_off_produces_no_writes() {
    let host = ringed_world().build();
    let service = service(
        &host,
        InMemorySettings::new().with(SettingKey::AutoImageSync, false),
    );

    let outcome = change_actor(&service, &host, "actor-a", json!({ "img": "new.png" })).await;

    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::NothingToDo));
    assert_eq!(host.token("token-1").unwrap().fields.texture.src, "bob.png");
}

#[tokio::test]
async fn test_name_and_image_in_one_change_run_both_rules() {
    let host = ringed_world().build();
    let service = service(&host, InMemorySettings::new());

    let report = change_actor(
        &service,
        &host,
        "actor-a",
        json!({ "name": "Bobby", "img": "bobby.png" }),
    )
    .await
    .report()
    .unwrap();

    assert_eq!(report.failures, 0);
    let actor = host.actor("actor-a").unwrap();
    assert_eq!(actor.prototype_token.name, "Bobby");
    assert_eq!(actor.prototype_token.texture.src, "bobby.png");
    let token = host.token("token-1").unwrap();
    assert_eq!(token.fields.name, "Bobby");
    assert_eq!(token.fields.texture.src, "bobby.png");
}

#[tokio::test]
async fn test_scene_tokens_already_ringless_are_left_out_of_batch() {
    let host = WorldBuilder::new()
        .actor(ringed_actor())
        .token(TokenDocument::new(
            "ringed",
            "actor-a",
            TokenFields::new("Bob", "bob.png").with_ring(true),
        ))
        .token(TokenDocument::new(
            "plain",
            "actor-a",
            TokenFields::new("Bob", "bob.png"),
        ))
        .build();
    let service = service(
        &host,
        InMemorySettings::new().with(SettingKey::DisableTokenRing, true),
    );

    change_actor(&service, &host, "actor-a", json!({ "img": "bob.png" })).await;

    let batch: Vec<String> = host
        .writes()
        .into_iter()
        .filter_map(|w| match w {
            WriteRecord::EmbeddedTokens { updates, .. } => Some(updates),
            _ => None,
        })
        .flatten()
        .map(|u| u.id)
        .collect();
    assert_eq!(batch, vec!["ringed"]);
}
