#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::{json, Value};
use sync_token_core::host::{DocumentHost, InMemoryHost, Scene, WorldState};
use sync_token_core::model::OwnershipLevel;
use sync_token_core::{Actor, InMemorySettings, SettingsStore, SyncOutcome, SyncService, TokenDocument};

/// User every fixture world runs as
pub const USER: &str = "user-1";
/// Another user present in the world
pub const OTHER_USER: &str = "user-2";
pub const SCENE: &str = "scene-1";

/// Fluent builder for in-memory test worlds
///
/// Actors added with `actor` are owned by `USER`; tokens go onto the single
/// active scene unless `no_scene` is called.
pub struct WorldBuilder {
    world: WorldState,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            world: WorldState {
                current_user: Some(USER.to_string()),
                active_scene: Some(Scene {
                    id: SCENE.to_string(),
                    tokens: Vec::new(),
                }),
                ..WorldState::default()
            },
        }
    }

    pub fn actor(self, actor: Actor) -> Self {
        self.actor_with_level(actor, USER, OwnershipLevel::Owner)
    }

    pub fn actor_with_level(self, actor: Actor, user: &str, level: OwnershipLevel) -> Self {
        let mut this = self.ownership(&actor.id, user, level);
        if !this.world.actors.iter().any(|a| a.id == actor.id) {
            this.world.actors.push(actor);
        }
        this
    }

    /// Ownership entry without the actor document itself
    pub fn ownership(mut self, actor_id: &str, user: &str, level: OwnershipLevel) -> Self {
        self.world
            .ownership
            .entry(actor_id.to_string())
            .or_insert_with(BTreeMap::new)
            .insert(user.to_string(), level);
        self
    }

    pub fn token(mut self, token: TokenDocument) -> Self {
        if let Some(scene) = self.world.active_scene.as_mut() {
            scene.tokens.push(token);
        }
        self
    }

    /// Restrict a token's owners to exactly `users`
    pub fn token_owners(mut self, token_id: &str, users: &[&str]) -> Self {
        self.world.token_owners.insert(
            token_id.to_string(),
            users.iter().map(|u| u.to_string()).collect::<BTreeSet<_>>(),
        );
        self
    }

    pub fn no_scene(mut self) -> Self {
        self.world.active_scene = None;
        self
    }

    pub fn build(self) -> Arc<InMemoryHost> {
        Arc::new(InMemoryHost::new(self.world))
    }
}

pub fn service(host: &Arc<InMemoryHost>, settings: InMemorySettings) -> SyncService {
    let host: Arc<dyn DocumentHost> = host.clone();
    let settings: Arc<dyn SettingsStore> = Arc::new(settings);
    SyncService::new(host, settings)
}

/// Apply `payload` to the actor the way the host would, then notify
pub async fn change_actor(
    service: &SyncService,
    host: &InMemoryHost,
    actor_id: &str,
    payload: Value,
) -> SyncOutcome {
    let actor = host
        .apply_actor_change(actor_id, &payload)
        .expect("actor exists in fixture world");
    service.on_actor_updated(&actor, &payload, USER).await
}

pub async fn rename(
    service: &SyncService,
    host: &InMemoryHost,
    actor_id: &str,
    name: &str,
) -> SyncOutcome {
    change_actor(service, host, actor_id, json!({ "name": name })).await
}
