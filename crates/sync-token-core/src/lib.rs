//! sync-token core - keeps token identity in step with its actor
//!
//! This crate provides:
//! - The domain model (actors, token fields, patches, update documents)
//! - Policy toggles and the per-actor force-sync override
//! - The propagation engine deciding which representations to write
//! - The representation writer committing plans against a host
//! - The event router the host calls on lifecycle notifications
//! - An in-memory host for tests and offline replay
//! - Structured logging and the error facility shared by all of the above

pub mod engine;
pub mod errors;
pub mod flags;
pub mod host;
pub mod logging_facility;
pub mod model;
pub mod panel;
pub mod policy;
pub mod router;
pub mod settings_file;
pub mod writer;

pub use sync_token_core_types;

// Re-export commonly used types
pub use engine::{IntentOrigin, IntentTarget, SyncInput, SyncPlan, WriteIntent};
pub use errors::{ExError, ExErrorKind, Result, SyncError};
pub use host::{DocumentHost, InMemoryHost, WorldState};
pub use model::{Actor, ActorChanges, TokenDocument, TokenFields, TokenPatch};
pub use policy::{InMemorySettings, Policy, SettingKey, SettingValue, SettingsStore};
pub use router::{SkipReason, SyncOutcome, SyncService};
pub use writer::{RepresentationWriter, WriteReport};
