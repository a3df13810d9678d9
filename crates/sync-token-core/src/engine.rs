//! Propagation engine
//!
//! Pure decision logic: from an actor snapshot, the identity fields a
//! notification carried, the policy and the override flag, compute every
//! write the sync pass needs. Nothing here performs I/O; the writer commits
//! the resulting plan.
//!
//! ## Loop safety
//!
//! Writes made by a sync pass can themselves trigger host notifications.
//! The only thing that stops a pass from feeding itself is that no intent
//! ever restates a value its target already holds. The engine diffs against
//! the snapshot it was given and the writer diffs again against live state
//! before each call; both checks are mandatory.

use crate::model::{Actor, ActorChanges, TokenDocument, TokenFields, TokenPatch};
use crate::policy::Policy;

/// Which representation an intent writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentTarget {
    /// The actor's prototype token
    Prototype { actor_id: String },
    /// Every owned token of the actor on the active scene
    SceneTokens { actor_id: String },
    /// The single token behind a synthetic (unlinked) actor
    UnlinkedToken { token_id: String },
    /// A token that has not been created yet
    NewTokenSeed { token_id: String },
}

/// Rule that produced an intent
///
/// Intents from different rules are independent. The writer runs the name
/// and image chains concurrently and keeps order only inside a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentOrigin {
    Mirror,
    Name,
    Image,
    Seed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteIntent {
    pub target: IntentTarget,
    pub origin: IntentOrigin,
    pub patch: TokenPatch,
}

/// Every intent of one notification, in commit order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub intents: Vec<WriteIntent>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// Intents produced by `origin`, in order
    pub fn by_origin(&self, origin: IntentOrigin) -> impl Iterator<Item = &WriteIntent> {
        self.intents.iter().filter(move |i| i.origin == origin)
    }
}

/// Inputs to one actor-changed decision
#[derive(Debug, Clone, Copy)]
pub struct SyncInput<'a> {
    /// Actor state after the change
    pub actor: &'a Actor,
    pub changes: &'a ActorChanges,
    pub policy: Policy,
    /// The actor's `alwaysSync` override
    pub force_sync: bool,
    /// The placed token behind a synthetic actor, when there is one
    pub unlinked_token: Option<&'a TokenDocument>,
}

/// Plan every write for an actor-changed notification
///
/// Order: unlinked mirror, name intents, image intents. Each rule is
/// evaluated on its own; one rule firing never suppresses another.
pub fn plan_actor_update(input: &SyncInput<'_>) -> SyncPlan {
    let mut intents = Vec::new();

    if let Some(token) = input.unlinked_token {
        intents.extend(plan_unlinked_mirror(input.changes, token));
    }

    if let Some(name) = &input.changes.name {
        if input.policy.auto_name_sync || input.force_sync {
            intents.extend(plan_name(input.actor, name));
        }
    }

    if let Some(img) = &input.changes.img {
        if input.policy.auto_image_sync || input.force_sync {
            let disable_ring = input.policy.disable_token_ring || input.force_sync;
            intents.extend(plan_image(input.actor, img, disable_ring));
        }
    }

    SyncPlan { intents }
}

/// Name rule, without the policy gate
///
/// The prototype intent is dropped when the prototype already carries the
/// name. The scene intent is always emitted; tokens that already match are
/// filtered per token by the writer.
pub fn plan_name(actor: &Actor, name: &str) -> Vec<WriteIntent> {
    let desired = TokenPatch::default().name(name);
    let mut intents = Vec::with_capacity(2);

    let prototype = desired.diff(&actor.prototype_token);
    if !prototype.is_empty() {
        intents.push(WriteIntent {
            target: IntentTarget::Prototype {
                actor_id: actor.id.clone(),
            },
            origin: IntentOrigin::Name,
            patch: prototype,
        });
    }

    intents.push(WriteIntent {
        target: IntentTarget::SceneTokens {
            actor_id: actor.id.clone(),
        },
        origin: IntentOrigin::Name,
        patch: desired,
    });
    intents
}

/// Image rule, without the policy gate
///
/// Short-circuits to nothing when the prototype already shows `img` and no
/// ring change is requested. Otherwise the prototype gets whichever of
/// texture and ring differ, and scene tokens get the texture (if it differed
/// on the prototype) plus the ring change.
pub fn plan_image(actor: &Actor, img: &str, disable_ring: bool) -> Vec<WriteIntent> {
    let prototype_img = actor.prototype_token.texture.src.as_str();
    if prototype_img == img && !disable_ring {
        return Vec::new();
    }

    let mut desired = TokenPatch::default();
    if prototype_img != img {
        desired.texture_src = Some(img.to_string());
    }
    if disable_ring {
        desired.ring_enabled = Some(false);
    }

    let mut intents = Vec::with_capacity(2);
    let prototype = desired.diff(&actor.prototype_token);
    if !prototype.is_empty() {
        intents.push(WriteIntent {
            target: IntentTarget::Prototype {
                actor_id: actor.id.clone(),
            },
            origin: IntentOrigin::Image,
            patch: prototype,
        });
    }
    if !desired.is_empty() {
        intents.push(WriteIntent {
            target: IntentTarget::SceneTokens {
                actor_id: actor.id.clone(),
            },
            origin: IntentOrigin::Image,
            patch: desired,
        });
    }
    intents
}

/// Mirror changed identity fields onto the token behind a synthetic actor
///
/// Not gated by policy: the synthetic actor and its token are one entity
/// from the user's point of view.
pub fn plan_unlinked_mirror(changes: &ActorChanges, token: &TokenDocument) -> Option<WriteIntent> {
    let desired = TokenPatch {
        name: changes.name.clone(),
        texture_src: changes.img.clone(),
        ring_enabled: None,
    };
    let patch = desired.diff(&token.fields);
    (!patch.is_empty()).then(|| WriteIntent {
        target: IntentTarget::UnlinkedToken {
            token_id: token.id.clone(),
        },
        origin: IntentOrigin::Mirror,
        patch,
    })
}

/// Initial fields for a token about to be created
///
/// Seeds from the actor's current state since the token has nothing to
/// diff a change against. Fields the pending token already holds are left
/// out of the patch.
pub fn plan_token_seed(
    actor: &Actor,
    pending: &TokenDocument,
    policy: Policy,
    force_sync: bool,
) -> Option<WriteIntent> {
    let patch = seed_patch(actor, policy, force_sync).diff(&pending.fields);
    (!patch.is_empty()).then(|| WriteIntent {
        target: IntentTarget::NewTokenSeed {
            token_id: pending.id.clone(),
        },
        origin: IntentOrigin::Seed,
        patch,
    })
}

fn seed_patch(actor: &Actor, policy: Policy, force_sync: bool) -> TokenPatch {
    let mut patch = TokenPatch::default();
    if force_sync || policy.auto_name_sync {
        patch.name = Some(actor.name.clone());
    }
    if force_sync || policy.auto_image_sync {
        patch.texture_src = Some(actor.img.clone());
    }
    if force_sync || policy.disable_token_ring {
        patch.ring_enabled = Some(false);
    }
    patch
}

/// Fields `prototype` would hold after `plan` is committed
pub fn project_prototype(prototype: &TokenFields, plan: &SyncPlan) -> TokenFields {
    let mut fields = prototype.clone();
    for intent in &plan.intents {
        if let IntentTarget::Prototype { .. } = intent.target {
            intent.patch.apply_to(&mut fields);
        }
    }
    fields
}
