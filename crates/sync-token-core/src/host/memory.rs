//! In-memory host world
//!
//! Holds actors, one active scene with its placed tokens, and an ownership
//! table. Update documents are applied the way the host applies them (dotted
//! paths merged into the stored JSON). Every successful write is appended to
//! a write log, and individual write kinds can be made to fail.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DocumentHost, EmbeddedUpdate};
use crate::errors::{Result, SyncError};
use crate::model::{Actor, DocumentUpdate, OwnershipLevel, TokenDocument};

/// A scene and the tokens placed on it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub tokens: Vec<TokenDocument>,
}

/// Serializable world contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    #[serde(default)]
    pub current_user: Option<String>,

    #[serde(default)]
    pub actors: Vec<Actor>,

    #[serde(default)]
    pub active_scene: Option<Scene>,

    /// actor id -> user id -> level
    #[serde(default)]
    pub ownership: BTreeMap<String, BTreeMap<String, OwnershipLevel>>,

    /// Explicit token owners; tokens without an entry inherit actor ownership
    #[serde(default)]
    pub token_owners: BTreeMap<String, BTreeSet<String>>,
}

/// Kinds of outbound call, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriteKind {
    Actor,
    EmbeddedTokens,
    Token,
    SetFlag,
    GetFlag,
}

/// One committed write, in commit order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteRecord {
    Actor {
        actor_id: String,
        update: DocumentUpdate,
    },
    EmbeddedTokens {
        scene_id: String,
        updates: Vec<EmbeddedUpdate>,
    },
    Token {
        token_id: String,
        update: DocumentUpdate,
    },
    Flag {
        actor_id: String,
        namespace: String,
        key: String,
        value: Value,
    },
}

#[derive(Debug, Default)]
struct Inner {
    world: WorldState,
    writes: Vec<WriteRecord>,
    failing: BTreeSet<WriteKind>,
}

/// `DocumentHost` backed by a `WorldState` held in memory
#[derive(Debug, Default)]
pub struct InMemoryHost {
    inner: Mutex<Inner>,
}

impl InMemoryHost {
    pub fn new(world: WorldState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                world,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current world
    pub fn world(&self) -> WorldState {
        self.lock().world.clone()
    }

    /// Every write committed so far
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Make every future call of `kind` fail until `heal` is called
    pub fn fail(&self, kind: WriteKind) {
        self.lock().failing.insert(kind);
    }

    pub fn heal(&self, kind: WriteKind) {
        self.lock().failing.remove(&kind);
    }

    pub fn token(&self, token_id: &str) -> Option<TokenDocument> {
        let inner = self.lock();
        inner
            .world
            .active_scene
            .as_ref()?
            .tokens
            .iter()
            .find(|t| t.id == token_id)
            .cloned()
    }

    /// Apply an actor-side change the way the host would before notifying
    ///
    /// Returns the updated actor snapshot. Not logged as a sync write.
    ///
    /// # Errors
    ///
    /// Returns `MissingReference` if the actor does not exist, or
    /// `PersistenceFailure` if the change leaves the actor malformed.
    pub fn apply_actor_change(&self, actor_id: &str, payload: &Value) -> Result<Actor> {
        let mut update = DocumentUpdate::new();
        if let Some(fields) = payload.as_object() {
            for (key, value) in fields {
                update.set(key.clone(), value.clone());
            }
        }
        let mut inner = self.lock();
        let actor = find_actor_mut(&mut inner.world, actor_id)?;
        *actor = merge_update(actor, &update, actor_id)?;
        Ok(actor.clone())
    }

    /// Add a token to the active scene
    ///
    /// # Errors
    ///
    /// Returns `MissingReference` if there is no active scene.
    pub fn create_token(&self, token: TokenDocument) -> Result<()> {
        let mut inner = self.lock();
        let scene = inner
            .world
            .active_scene
            .as_mut()
            .ok_or_else(|| SyncError::MissingReference {
                kind: "scene",
                id: "active".to_string(),
            })?;
        scene.tokens.push(token);
        Ok(())
    }

    fn check(inner: &Inner, kind: WriteKind, target: &str) -> Result<()> {
        if inner.failing.contains(&kind) {
            return Err(SyncError::PersistenceFailure {
                target: target.to_string(),
                reason: format!("injected {:?} failure", kind),
            });
        }
        Ok(())
    }
}

fn find_actor_mut<'a>(world: &'a mut WorldState, actor_id: &str) -> Result<&'a mut Actor> {
    world
        .actors
        .iter_mut()
        .find(|a| a.id == actor_id)
        .ok_or_else(|| SyncError::MissingReference {
            kind: "actor",
            id: actor_id.to_string(),
        })
}

/// Apply `update` to a serializable document, returning the merged copy
fn merge_update<T>(doc: &T, update: &DocumentUpdate, target: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let persistence = |err: serde_json::Error| SyncError::PersistenceFailure {
        target: target.to_string(),
        reason: err.to_string(),
    };
    let mut value = serde_json::to_value(doc).map_err(persistence)?;
    update.apply_to(&mut value);
    serde_json::from_value(value).map_err(persistence)
}

#[async_trait]
impl DocumentHost for InMemoryHost {
    fn current_user(&self) -> Option<String> {
        self.lock().world.current_user.clone()
    }

    fn actor(&self, actor_id: &str) -> Option<Actor> {
        self.lock()
            .world
            .actors
            .iter()
            .find(|a| a.id == actor_id)
            .cloned()
    }

    fn actor_permission(&self, actor: &Actor, user_id: &str) -> OwnershipLevel {
        self.lock()
            .world
            .ownership
            .get(&actor.id)
            .and_then(|users| users.get(user_id))
            .copied()
            .unwrap_or(OwnershipLevel::None)
    }

    fn active_scene(&self) -> Option<String> {
        self.lock().world.active_scene.as_ref().map(|s| s.id.clone())
    }

    fn placed_tokens(&self, scene_id: &str) -> Vec<TokenDocument> {
        self.lock()
            .world
            .active_scene
            .as_ref()
            .filter(|s| s.id == scene_id)
            .map(|s| s.tokens.clone())
            .unwrap_or_default()
    }

    fn placed_token(&self, token_id: &str) -> Option<TokenDocument> {
        self.token(token_id)
    }

    fn token_is_owner(&self, token: &TokenDocument, user_id: &str) -> bool {
        let inner = self.lock();
        if let Some(owners) = inner.world.token_owners.get(&token.id) {
            return owners.contains(user_id);
        }
        token
            .actor_id
            .as_ref()
            .and_then(|actor_id| inner.world.ownership.get(actor_id))
            .and_then(|users| users.get(user_id))
            .is_some_and(|level| level.satisfies(OwnershipLevel::Owner))
    }

    fn get_flag(&self, actor: &Actor, namespace: &str, key: &str) -> Result<Option<Value>> {
        let inner = self.lock();
        if inner.failing.contains(&WriteKind::GetFlag) {
            return Err(SyncError::FlagReadFailure {
                actor_id: actor.id.clone(),
                namespace: namespace.to_string(),
                key: key.to_string(),
                reason: "flag scope not available".to_string(),
            });
        }
        Ok(actor.raw_flag(namespace, key).cloned())
    }

    async fn set_flag(
        &self,
        actor_id: &str,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner, WriteKind::SetFlag, actor_id)?;
        find_actor_mut(&mut inner.world, actor_id)?.set_raw_flag(namespace, key, value.clone());
        inner.writes.push(WriteRecord::Flag {
            actor_id: actor_id.to_string(),
            namespace: namespace.to_string(),
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    async fn update_actor(&self, actor_id: &str, update: DocumentUpdate) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner, WriteKind::Actor, actor_id)?;
        let actor = find_actor_mut(&mut inner.world, actor_id)?;
        *actor = merge_update(actor, &update, actor_id)?;
        inner.writes.push(WriteRecord::Actor {
            actor_id: actor_id.to_string(),
            update,
        });
        Ok(())
    }

    async fn update_embedded_tokens(
        &self,
        scene_id: &str,
        updates: Vec<EmbeddedUpdate>,
    ) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner, WriteKind::EmbeddedTokens, scene_id)?;
        let scene = inner
            .world
            .active_scene
            .as_mut()
            .filter(|s| s.id == scene_id)
            .ok_or_else(|| SyncError::MissingReference {
                kind: "scene",
                id: scene_id.to_string(),
            })?;

        // Validate the whole batch before touching anything.
        let mut merged = Vec::with_capacity(updates.len());
        for entry in &updates {
            let index = scene
                .tokens
                .iter()
                .position(|t| t.id == entry.id)
                .ok_or_else(|| SyncError::MissingReference {
                    kind: "token",
                    id: entry.id.clone(),
                })?;
            merged.push((index, merge_update(&scene.tokens[index], &entry.update, &entry.id)?));
        }
        for (index, token) in merged {
            scene.tokens[index] = token;
        }

        inner.writes.push(WriteRecord::EmbeddedTokens {
            scene_id: scene_id.to_string(),
            updates,
        });
        Ok(())
    }

    async fn update_token(&self, token_id: &str, update: DocumentUpdate) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner, WriteKind::Token, token_id)?;
        let token = inner
            .world
            .active_scene
            .as_mut()
            .and_then(|s| s.tokens.iter_mut().find(|t| t.id == token_id))
            .ok_or_else(|| SyncError::MissingReference {
                kind: "token",
                id: token_id.to_string(),
            })?;
        *token = merge_update(token, &update, token_id)?;
        inner.writes.push(WriteRecord::Token {
            token_id: token_id.to_string(),
            update,
        });
        Ok(())
    }
}
