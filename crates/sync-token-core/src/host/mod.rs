//! The host application as seen by the sync core
//!
//! Reads are synchronous snapshots; writes are asynchronous and may fail.
//! Everything the core needs from the host goes through `DocumentHost`, so
//! the engine and writer can be driven by `InMemoryHost` in tests and by a
//! real bridge in production.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;
use crate::model::{Actor, DocumentUpdate, OwnershipLevel, TokenDocument};

pub use memory::{InMemoryHost, Scene, WorldState, WriteKind, WriteRecord};

/// One entry of a batched embedded-token update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedUpdate {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub update: DocumentUpdate,
}

/// Outbound surface of the host application
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// User this client is running as
    fn current_user(&self) -> Option<String>;

    /// Current snapshot of an actor
    fn actor(&self, actor_id: &str) -> Option<Actor>;

    /// Permission level `user_id` holds on `actor`
    fn actor_permission(&self, actor: &Actor, user_id: &str) -> OwnershipLevel;

    /// Scene currently shown on the canvas
    fn active_scene(&self) -> Option<String>;

    /// Tokens placed on `scene_id`
    fn placed_tokens(&self, scene_id: &str) -> Vec<TokenDocument>;

    /// A token placed on the active canvas
    fn placed_token(&self, token_id: &str) -> Option<TokenDocument>;

    /// Whether `user_id` owns the placed token
    fn token_is_owner(&self, token: &TokenDocument, user_id: &str) -> bool;

    /// Read a namespaced flag through the host flag API
    ///
    /// # Errors
    ///
    /// Returns `FlagReadFailure` when the namespace is not available (for
    /// example, the module has not finished initializing).
    fn get_flag(&self, actor: &Actor, namespace: &str, key: &str) -> Result<Option<Value>>;

    /// Persist a namespaced flag through the host flag API
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` when the host rejects the write.
    async fn set_flag(&self, actor_id: &str, namespace: &str, key: &str, value: Value)
        -> Result<()>;

    /// Apply an update document to an actor
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` or `MissingReference`.
    async fn update_actor(&self, actor_id: &str, update: DocumentUpdate) -> Result<()>;

    /// Apply one batch of updates to tokens embedded in a scene
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` or `MissingReference`.
    async fn update_embedded_tokens(&self, scene_id: &str, updates: Vec<EmbeddedUpdate>)
        -> Result<()>;

    /// Apply an update document to a single placed token
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` or `MissingReference`.
    async fn update_token(&self, token_id: &str, update: DocumentUpdate) -> Result<()>;
}
