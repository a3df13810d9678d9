//! Representation writer
//!
//! Commits a `SyncPlan` against the host. Every write is best-effort: a
//! failure is logged, counted in the `WriteReport`, and never stops sibling
//! writes. Every path diffs against live state first and skips the call
//! entirely when nothing would change.

use std::ops::AddAssign;
use std::time::Instant;

use sync_token_core_types::PassId;

use crate::engine::{IntentOrigin, IntentTarget, SyncPlan, WriteIntent};
use crate::host::{DocumentHost, EmbeddedUpdate};
use crate::model::{Actor, TokenDocument, TokenPatch};
use crate::policy::Policy;
use crate::{log_op_end, log_op_error, log_op_skip};

/// Update-document prefix for prototype token fields on an actor
pub const PROTOTYPE_PREFIX: &str = "prototypeToken.";

/// Outcome counts of one commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Host calls that succeeded
    pub writes: usize,
    /// Host calls that failed
    pub failures: usize,
    /// Intents that needed no host call
    pub skipped: usize,
    /// Individual tokens changed by scene batches, mirrors and seeds
    pub tokens_touched: usize,
}

impl WriteReport {
    /// True when the commit issued no host calls at all
    pub fn is_noop(&self) -> bool {
        self.writes == 0 && self.failures == 0
    }
}

impl AddAssign for WriteReport {
    fn add_assign(&mut self, rhs: Self) {
        self.writes += rhs.writes;
        self.failures += rhs.failures;
        self.skipped += rhs.skipped;
        self.tokens_touched += rhs.tokens_touched;
    }
}

/// Commits plans on behalf of one user during one sync pass
pub struct RepresentationWriter<'a> {
    host: &'a dyn DocumentHost,
    policy: Policy,
    user_id: &'a str,
    pass_id: &'a PassId,
}

impl<'a> RepresentationWriter<'a> {
    pub fn new(
        host: &'a dyn DocumentHost,
        policy: Policy,
        user_id: &'a str,
        pass_id: &'a PassId,
    ) -> Self {
        Self {
            host,
            policy,
            user_id,
            pass_id,
        }
    }

    /// Commit every persisted intent of `plan`
    ///
    /// The unlinked mirror goes first. The name chain and the image chain
    /// then run side by side; inside a chain the prototype write completes
    /// before the scene batch is built. Seed intents are ignored here, see
    /// [`seed_pending`].
    pub async fn commit(&self, plan: &SyncPlan) -> WriteReport {
        let mut report = WriteReport::default();
        for intent in plan.by_origin(IntentOrigin::Mirror) {
            report += self.write(intent).await;
        }

        let (name, image) = futures::join!(
            self.run_chain(plan, IntentOrigin::Name),
            self.run_chain(plan, IntentOrigin::Image),
        );
        report += name;
        report += image;
        report
    }

    async fn run_chain(&self, plan: &SyncPlan, origin: IntentOrigin) -> WriteReport {
        let mut report = WriteReport::default();
        for intent in plan.by_origin(origin) {
            report += self.write(intent).await;
        }
        report
    }

    async fn write(&self, intent: &WriteIntent) -> WriteReport {
        match &intent.target {
            IntentTarget::Prototype { actor_id } => self.write_prototype(actor_id, &intent.patch).await,
            IntentTarget::SceneTokens { actor_id } => {
                self.write_scene_tokens(actor_id, &intent.patch).await
            }
            IntentTarget::UnlinkedToken { token_id } => {
                self.write_unlinked(token_id, &intent.patch).await
            }
            IntentTarget::NewTokenSeed { .. } => WriteReport {
                skipped: 1,
                ..WriteReport::default()
            },
        }
    }

    /// One actor update for the prototype, skipped when already in place
    pub async fn write_prototype(&self, actor_id: &str, patch: &TokenPatch) -> WriteReport {
        let start = Instant::now();
        let Some(live) = self.host.actor(actor_id) else {
            log_op_skip!("write_prototype", reason = "missing_actor", actor_id, pass_id = %self.pass_id);
            return WriteReport {
                skipped: 1,
                ..WriteReport::default()
            };
        };
        let patch = patch.diff(&live.prototype_token);
        if patch.is_empty() {
            log_op_skip!("write_prototype", reason = "no_change", actor_id, pass_id = %self.pass_id);
            return WriteReport {
                skipped: 1,
                ..WriteReport::default()
            };
        }

        match self
            .host
            .update_actor(actor_id, patch.to_update(PROTOTYPE_PREFIX))
            .await
        {
            Ok(()) => {
                log_op_end!(
                    "write_prototype",
                    duration_ms = start.elapsed().as_millis() as u64,
                    actor_id,
                    pass_id = %self.pass_id
                );
                WriteReport {
                    writes: 1,
                    ..WriteReport::default()
                }
            }
            Err(err) => {
                log_op_error!(
                    "write_prototype",
                    err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    actor_id,
                    pass_id = %self.pass_id
                );
                WriteReport {
                    failures: 1,
                    ..WriteReport::default()
                }
            }
        }
    }

    /// One batched update covering every owned token of the actor on the
    /// active scene that does not already match
    pub async fn write_scene_tokens(&self, actor_id: &str, patch: &TokenPatch) -> WriteReport {
        let start = Instant::now();
        let skipped = |reason: &str| {
            log_op_skip!("write_scene_tokens", reason = reason, actor_id, pass_id = %self.pass_id);
            WriteReport {
                skipped: 1,
                ..WriteReport::default()
            }
        };

        if !self.policy.sync_scene_tokens {
            return skipped("scene_sync_disabled");
        }
        let Some(scene_id) = self.host.active_scene() else {
            return skipped("no_active_scene");
        };

        let updates = scene_batch(
            &self.host.placed_tokens(&scene_id),
            actor_id,
            patch,
            |token| self.host.token_is_owner(token, self.user_id),
        );
        if updates.is_empty() {
            return skipped("no_change");
        }

        let batch_len = updates.len();
        match self.host.update_embedded_tokens(&scene_id, updates).await {
            Ok(()) => {
                log_op_end!(
                    "write_scene_tokens",
                    duration_ms = start.elapsed().as_millis() as u64,
                    actor_id,
                    scene_id = %scene_id,
                    batch_len,
                    pass_id = %self.pass_id
                );
                WriteReport {
                    writes: 1,
                    tokens_touched: batch_len,
                    ..WriteReport::default()
                }
            }
            Err(err) => {
                log_op_error!(
                    "write_scene_tokens",
                    err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    actor_id,
                    scene_id = %scene_id,
                    batch_len,
                    pass_id = %self.pass_id
                );
                WriteReport {
                    failures: 1,
                    ..WriteReport::default()
                }
            }
        }
    }

    /// One direct update of the token behind a synthetic actor
    pub async fn write_unlinked(&self, token_id: &str, patch: &TokenPatch) -> WriteReport {
        let start = Instant::now();
        let Some(token) = self.host.placed_token(token_id) else {
            log_op_skip!("write_unlinked", reason = "missing_token", token_id, pass_id = %self.pass_id);
            return WriteReport {
                skipped: 1,
                ..WriteReport::default()
            };
        };
        let patch = patch.diff(&token.fields);
        if patch.is_empty() {
            log_op_skip!("write_unlinked", reason = "no_change", token_id, pass_id = %self.pass_id);
            return WriteReport {
                skipped: 1,
                ..WriteReport::default()
            };
        }

        match self.host.update_token(token_id, patch.to_update("")).await {
            Ok(()) => {
                log_op_end!(
                    "write_unlinked",
                    duration_ms = start.elapsed().as_millis() as u64,
                    token_id,
                    pass_id = %self.pass_id
                );
                WriteReport {
                    writes: 1,
                    tokens_touched: 1,
                    ..WriteReport::default()
                }
            }
            Err(err) => {
                log_op_error!(
                    "write_unlinked",
                    err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    token_id,
                    pass_id = %self.pass_id
                );
                WriteReport {
                    failures: 1,
                    ..WriteReport::default()
                }
            }
        }
    }
}

/// Per-token updates for one scene batch
///
/// Keeps tokens that reference `actor_id` and pass `is_owner`, diffs the
/// patch against each, and drops tokens that already match.
pub fn scene_batch<F>(
    tokens: &[TokenDocument],
    actor_id: &str,
    patch: &TokenPatch,
    is_owner: F,
) -> Vec<EmbeddedUpdate>
where
    F: Fn(&TokenDocument) -> bool,
{
    tokens
        .iter()
        .filter(|token| token.references(actor_id))
        .filter(|token| is_owner(token))
        .filter_map(|token| {
            let diff = patch.diff(&token.fields);
            (!diff.is_empty()).then(|| EmbeddedUpdate {
                id: token.id.clone(),
                update: diff.to_update(""),
            })
        })
        .collect()
}

/// Write seed fields into a token that has not been created yet
///
/// Returns whether anything changed.
pub fn seed_pending(pending: &mut TokenDocument, patch: &TokenPatch) -> bool {
    let patch = patch.diff(&pending.fields);
    if patch.is_empty() {
        return false;
    }
    patch.apply_to(&mut pending.fields);
    true
}

/// Live prototype of `actor`, falling back to the snapshot
pub fn live_actor(host: &dyn DocumentHost, actor: &Actor) -> Actor {
    host.actor(&actor.id).unwrap_or_else(|| actor.clone())
}
