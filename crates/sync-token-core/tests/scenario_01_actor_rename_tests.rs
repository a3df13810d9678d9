#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{rename, service, WorldBuilder, OTHER_USER, SCENE, USER};
use serde_json::json;
use sync_token_core::host::{WriteKind, WriteRecord};
use sync_token_core::model::OwnershipLevel;
use sync_token_core::{
    Actor, DocumentHost, InMemorySettings, SettingKey, SkipReason, SyncOutcome, TokenDocument,
    TokenFields,
};

fn bob_world() -> common::WorldBuilder {
    WorldBuilder::new()
        .actor(Actor::new("actor-a", "Bob", "bob.png"))
        .token(TokenDocument::new(
            "token-1",
            "actor-a",
            TokenFields::new("Bob", "bob.png"),
        ))
}

#[tokio::test]
async fn test_rename_updates_prototype_and_owned_scene_token() {
    // Scenario: actor A renamed "Bob" -> "Bobby" by its owner with one owned token
    // Then: prototype renamed, exactly one batch renaming that token
    let host = bob_world().build();
    let service = service(&host, InMemorySettings::new());

    let outcome = rename(&service, &host, "actor-a", "Bobby").await;

    let report = outcome.report().expect("pass committed");
    assert_eq!(report.writes, 2);
    assert_eq!(report.failures, 0);

    let writes = host.writes();
    assert_eq!(writes.len(), 2);
    match &writes[0] {
        WriteRecord::Actor { actor_id, update } => {
            assert_eq!(actor_id, "actor-a");
            assert_eq!(update.get("prototypeToken.name"), Some(&json!("Bobby")));
            assert_eq!(update.len(), 1);
        }
        other => panic!("expected prototype update first, got {:?}", other),
    }
    match &writes[1] {
        WriteRecord::EmbeddedTokens { scene_id, updates } => {
            assert_eq!(scene_id, SCENE);
            assert_eq!(updates.len(), 1);
            assert_eq!(updates[0].id, "token-1");
            assert_eq!(updates[0].update.get("name"), Some(&json!("Bobby")));
        }
        other => panic!("expected scene batch second, got {:?}", other),
    }

    assert_eq!(host.actor("actor-a").unwrap().prototype_token.name, "Bobby");
    assert_eq!(host.token("token-1").unwrap().fields.name, "Bobby");
}

#[tokio::test]
async fn test_same_rename_twice_writes_nothing_the_second_time() {
    let host = bob_world().build();
    let service = service(&host, InMemorySettings::new());

    rename(&service, &host, "actor-a", "Bobby").await;
    let after_first = host.writes().len();

    let outcome = rename(&service, &host, "actor-a", "Bobby").await;

    assert_eq!(host.writes().len(), after_first);
    assert!(outcome.report().unwrap().is_noop());
}

#[tokio::test]
async fn test_name_toggle_off_produces_no_writes() {
    let host = bob_world().build();
    let service = service(
        &host,
        InMemorySettings::new().with(SettingKey::AutoNameSync, false),
    );

    let outcome = rename(&service, &host, "actor-a", "Bobby").await;

    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::NothingToDo));
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn test_change_by_other_client_is_ignored() {
    let host = bob_world().build();
    let service = service(&host, InMemorySettings::new());
    let actor = host.apply_actor_change("actor-a", &json!({ "name": "Bobby" })).unwrap();

    let outcome = service
        .on_actor_updated(&actor, &json!({ "name": "Bobby" }), OTHER_USER)
        .await;

    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::OtherUser));
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn test_non_owner_is_never_synced_for() {
    let host = WorldBuilder::new()
        .actor_with_level(
            Actor::new("actor-a", "Bob", "bob.png"),
            USER,
            OwnershipLevel::Observer,
        )
        .token(TokenDocument::new(
            "token-1",
            "actor-a",
            TokenFields::new("Bob", "bob.png"),
        ))
        .build();
    let service = service(&host, InMemorySettings::new());

    let outcome = rename(&service, &host, "actor-a", "Bobby").await;

    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::NotOwner));
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn test_change_without_identity_fields_is_ignored() {
    let host = bob_world().build();
    let service = service(&host, InMemorySettings::new());

    // A non-string name is not an identity change; the host would not accept
    // it as a document value either, so notify with the raw payload directly
    let actor = host.actor("actor-a").unwrap();
    let outcome = service
        .on_actor_updated(&actor, &json!({ "system": { "hp": 4 }, "name": 7 }), USER)
        .await;

    assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::NoIdentityChange));
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn test_rename_of_actor_gone_from_host_writes_nothing() {
    // Scenario: the change arrives for an actor the host no longer holds
    // Then: no prototype write is attempted and nothing counts as a failure
    let host = WorldBuilder::new()
        .ownership("actor-gone", USER, OwnershipLevel::Owner)
        .build();
    let service = service(&host, InMemorySettings::new());
    let mut snapshot = Actor::new("actor-gone", "Bobby", "bob.png");
    snapshot.prototype_token.name = "Bob".to_string();

    let outcome = service
        .on_actor_updated(&snapshot, &json!({ "name": "Bobby" }), USER)
        .await;

    let report = outcome.report().expect("pass committed");
    assert_eq!(report.writes, 0);
    assert_eq!(report.failures, 0);
    assert_eq!(report.skipped, 2);
    assert!(host.writes().is_empty());
}

#[tokio::test]
async fn test_batch_excludes_other_actors_and_unowned_tokens() {
    let host = WorldBuilder::new()
        .actor(Actor::new("actor-a", "Bob", "bob.png"))
        .actor(Actor::new("actor-z", "Zed", "zed.png"))
        .token(TokenDocument::new("mine-linked", "actor-a", TokenFields::new("Bob", "bob.png")))
        .token(
            TokenDocument::new("mine-unlinked", "actor-a", TokenFields::new("Bob", "bob.png"))
                .unlinked(),
        )
        .token(TokenDocument::new("not-mine", "actor-a", TokenFields::new("Bob", "bob.png")))
        .token(TokenDocument::new("other-actor", "actor-z", TokenFields::new("Bob", "zed.png")))
        .token_owners("not-mine", &[OTHER_USER])
        .build();
    let service = service(&host, InMemorySettings::new());

    rename(&service, &host, "actor-a", "Bobby").await;

    let batch_ids: Vec<String> = host
        .writes()
        .into_iter()
        .filter_map(|w| match w {
            WriteRecord::EmbeddedTokens { updates, .. } => Some(updates),
            _ => None,
        })
        .flatten()
        .map(|u| u.id)
        .collect();
    assert_eq!(batch_ids, vec!["mine-linked", "mine-unlinked"]);
    assert_eq!(host.token("not-mine").unwrap().fields.name, "Bob");
    assert_eq!(host.token("other-actor").unwrap().fields.name, "Bob");
}

#[tokio::test]
async fn test_scene_sync_disabled_touches_prototype_only() {
    let host = bob_world().build();
    let service = service(
        &host,
        InMemorySettings::new().with(SettingKey::SyncSceneTokens, false),
    );

    let report = rename(&service, &host, "actor-a", "Bobby").await.report().unwrap();

    assert_eq!(report.writes, 1);
    assert_eq!(host.token("token-1").unwrap().fields.name, "Bob");
    assert_eq!(host.actor("actor-a").unwrap().prototype_token.name, "Bobby");
}

#[tokio::test]
async fn test_no_active_scene_touches_prototype_only() {
    let host = WorldBuilder::new()
        .actor(Actor::new("actor-a", "Bob", "bob.png"))
        .no_scene()
        .build();
    let service = service(&host, InMemorySettings::new());

    let report = rename(&service, &host, "actor-a", "Bobby").await.report().unwrap();

    assert_eq!(report.writes, 1);
    assert!(matches!(host.writes()[0], WriteRecord::Actor { .. }));
}

#[tokio::test]
async fn test_failed_prototype_write_does_not_block_scene_batch() {
    let host = bob_world().build();
    host.fail(WriteKind::Actor);
    let service = service(&host, InMemorySettings::new());

    let report = rename(&service, &host, "actor-a", "Bobby").await.report().unwrap();

    assert_eq!(report.failures, 1);
    assert_eq!(report.writes, 1);
    assert_eq!(host.token("token-1").unwrap().fields.name, "Bobby");
    assert_eq!(host.actor("actor-a").unwrap().prototype_token.name, "Bob");

    // Self-heals on the next triggering change
    host.heal(WriteKind::Actor);
    rename(&service, &host, "actor-a", "Bobby").await;
    assert_eq!(host.actor("actor-a").unwrap().prototype_token.name, "Bobby");
}
