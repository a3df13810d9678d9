//! Event router
//!
//! Entry points the host calls on its lifecycle notifications. Each handler
//! applies the gates (acting user, identity fields, ownership), reads policy
//! and the override fresh, asks the engine for a plan, and hands the plan to
//! the writer. Handlers never return errors: a gate that fails yields
//! `SyncOutcome::Skipped`.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use sync_token_core_types::RequestContext;

use crate::engine::{self, SyncInput, SyncPlan};
use crate::errors::SyncError;
use crate::flags;
use crate::host::DocumentHost;
use crate::model::{Actor, ActorChanges, OwnershipLevel, TokenDocument};
use crate::policy::{Policy, SettingsStore};
use crate::writer::{self, RepresentationWriter, WriteReport};
use crate::{log_op_end, log_op_error, log_op_skip, log_op_start};

/// Why a notification produced no sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The change was made by another client
    OtherUser,
    /// Neither name nor image was part of the change
    NoIdentityChange,
    /// The acting user does not own the actor
    NotOwner,
    /// The referenced actor does not exist
    MissingActor,
    /// Every rule evaluated to "nothing to write"
    NothingToDo,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::OtherUser => "other_user",
            SkipReason::NoIdentityChange => "no_identity_change",
            SkipReason::NotOwner => "not_owner",
            SkipReason::MissingActor => "missing_actor",
            SkipReason::NothingToDo => "nothing_to_do",
        }
    }
}

/// Result of handling one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    Committed(WriteReport),
    /// A pending token had seed fields written into it
    Seeded,
}

impl SyncOutcome {
    pub fn report(&self) -> Option<WriteReport> {
        match self {
            SyncOutcome::Committed(report) => Some(*report),
            _ => None,
        }
    }
}

/// Binds the sync core to one host and one settings registry
pub struct SyncService {
    host: Arc<dyn DocumentHost>,
    settings: Arc<dyn SettingsStore>,
}

impl SyncService {
    pub fn new(host: Arc<dyn DocumentHost>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { host, settings }
    }

    pub fn host(&self) -> &dyn DocumentHost {
        self.host.as_ref()
    }

    /// Fresh policy snapshot
    pub fn policy(&self) -> Policy {
        Policy::read(self.settings.as_ref())
    }

    /// Current value of the actor's force-sync override
    pub fn force_sync(&self, actor: &Actor) -> bool {
        flags::read_override(self.host.as_ref(), actor)
    }

    /// Handle "actor updated"
    ///
    /// `actor` is the state after the update, `payload` the raw change
    /// document the host reported, `user_id` the user who made the change.
    pub async fn on_actor_updated(
        &self,
        actor: &Actor,
        payload: &Value,
        user_id: &str,
    ) -> SyncOutcome {
        const OP: &str = "actor_updated";
        let start = Instant::now();
        let ctx = RequestContext::new(user_id);

        if self.host.current_user().as_deref() != Some(user_id) {
            return self.skip(OP, &actor.id, &ctx, SkipReason::OtherUser);
        }
        let changes = ActorChanges::from_payload(payload);
        if !changes.touches_identity() {
            return self.skip(OP, &actor.id, &ctx, SkipReason::NoIdentityChange);
        }
        if let Err(err) = self.authorize(actor, user_id) {
            tracing::debug!(error = %err, "sync skipped");
            return self.skip(OP, &actor.id, &ctx, SkipReason::NotOwner);
        }

        log_op_start!(OP, actor_id = %actor.id, user_id = %ctx.user_id, pass_id = %ctx.pass_id);
        let policy = self.policy();
        let force_sync = self.force_sync(actor);
        let unlinked_token = actor
            .token_id
            .as_deref()
            .and_then(|token_id| self.host.placed_token(token_id));

        let plan = engine::plan_actor_update(&SyncInput {
            actor,
            changes: &changes,
            policy,
            force_sync,
            unlinked_token: unlinked_token.as_ref(),
        });

        self.commit(OP, actor, plan, policy, &ctx, start).await
    }

    /// Handle "token about to be created"
    ///
    /// Seeds the pending token in place; no host write is involved since the
    /// token does not exist yet.
    pub fn on_token_pre_create(&self, pending: &mut TokenDocument) -> SyncOutcome {
        const OP: &str = "token_pre_create";
        let start = Instant::now();

        let actor = pending
            .actor_id
            .as_deref()
            .and_then(|actor_id| self.host.actor(actor_id));
        let Some(actor) = actor else {
            let err = SyncError::MissingReference {
                kind: "actor",
                id: pending.actor_id.clone().unwrap_or_default(),
            };
            log_op_skip!(OP, reason = SkipReason::MissingActor.as_str(), error = %err, token_id = %pending.id);
            return SyncOutcome::Skipped(SkipReason::MissingActor);
        };

        let policy = self.policy();
        let force_sync = self.force_sync(&actor);
        let Some(intent) = engine::plan_token_seed(&actor, pending, policy, force_sync) else {
            log_op_skip!(OP, reason = SkipReason::NothingToDo.as_str(), token_id = %pending.id);
            return SyncOutcome::Skipped(SkipReason::NothingToDo);
        };

        writer::seed_pending(pending, &intent.patch);
        log_op_end!(
            OP,
            duration_ms = start.elapsed().as_millis() as u64,
            actor_id = %actor.id,
            token_id = %pending.id
        );
        SyncOutcome::Seeded
    }

    /// Push the actor's current image to its prototype and scene tokens
    ///
    /// Manual trigger: ignores the image toggle but still requires ownership
    /// and honours ring-disable.
    pub async fn sync_image_now(&self, actor: &Actor) -> SyncOutcome {
        const OP: &str = "sync_image_now";
        let start = Instant::now();
        let Some(user_id) = self.host.current_user() else {
            return SyncOutcome::Skipped(SkipReason::NotOwner);
        };
        let ctx = RequestContext::new(user_id);
        if self.authorize(actor, &ctx.user_id).is_err() {
            return self.skip(OP, &actor.id, &ctx, SkipReason::NotOwner);
        }

        log_op_start!(OP, actor_id = %actor.id, user_id = %ctx.user_id, pass_id = %ctx.pass_id);
        let actor = writer::live_actor(self.host.as_ref(), actor);
        let policy = self.policy();
        let disable_ring = policy.disable_token_ring || self.force_sync(&actor);
        let plan = SyncPlan {
            intents: engine::plan_image(&actor, &actor.img, disable_ring),
        };

        self.commit(OP, &actor, plan, policy, &ctx, start).await
    }

    /// Flip the actor's force-sync override, returning the value now in effect
    pub async fn toggle_force_sync(&self, actor: &Actor) -> bool {
        let actor = writer::live_actor(self.host.as_ref(), actor);
        let current = self.force_sync(&actor);
        let persisted = flags::write_override(self.host.as_ref(), &actor, !current).await;
        if persisted {
            !current
        } else {
            current
        }
    }

    fn authorize(&self, actor: &Actor, user_id: &str) -> Result<(), SyncError> {
        let level = self.host.actor_permission(actor, user_id);
        if level.satisfies(OwnershipLevel::Owner) {
            Ok(())
        } else {
            Err(SyncError::PermissionDenied {
                actor_id: actor.id.clone(),
                user_id: user_id.to_string(),
            })
        }
    }

    fn skip(&self, op: &str, actor_id: &str, ctx: &RequestContext, reason: SkipReason) -> SyncOutcome {
        log_op_skip!(op, reason = reason.as_str(), actor_id, pass_id = %ctx.pass_id);
        SyncOutcome::Skipped(reason)
    }

    async fn commit(
        &self,
        op: &str,
        actor: &Actor,
        plan: SyncPlan,
        policy: Policy,
        ctx: &RequestContext,
        start: Instant,
    ) -> SyncOutcome {
        if plan.is_empty() {
            log_op_skip!(op, reason = SkipReason::NothingToDo.as_str(), actor_id = %actor.id, pass_id = %ctx.pass_id);
            return SyncOutcome::Skipped(SkipReason::NothingToDo);
        }

        let writer = RepresentationWriter::new(self.host.as_ref(), policy, &ctx.user_id, &ctx.pass_id);
        let report = writer.commit(&plan).await;

        if report.failures > 0 {
            let err = SyncError::PersistenceFailure {
                target: actor.id.clone(),
                reason: format!("{} of {} writes failed", report.failures, report.writes + report.failures),
            };
            log_op_error!(
                op,
                err,
                duration_ms = start.elapsed().as_millis() as u64,
                actor_id = %actor.id,
                failures = report.failures,
                pass_id = %ctx.pass_id
            );
        } else {
            log_op_end!(
                op,
                duration_ms = start.elapsed().as_millis() as u64,
                actor_id = %actor.id,
                intents = plan.len(),
                writes = report.writes,
                pass_id = %ctx.pass_id
            );
        }
        SyncOutcome::Committed(report)
    }
}
