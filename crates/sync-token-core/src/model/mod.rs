pub mod actor;
pub mod changes;
pub mod token;
pub mod update;

pub use actor::{Actor, OwnershipLevel};
pub use changes::ActorChanges;
pub use token::{
    RingData, TextureData, TokenDocument, TokenFields, TokenPatch, KEY_NAME, KEY_RING_ENABLED,
    KEY_TEXTURE_SRC,
};
pub use update::DocumentUpdate;
