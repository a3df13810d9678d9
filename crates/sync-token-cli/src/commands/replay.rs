//! Replay command
//!
//! Usage: sync-token replay --world <world.json> --events <events.json> [--settings <file>]
//!
//! Events are applied in order. Actor changes are merged into the world
//! first, then the router is notified exactly as the host would notify it.
//! A change the world rejects (a non-string name, say) is reported as
//! `skipped:host_rejected` and the replay carries on; an unknown actor aborts.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sync_token_core::host::WriteRecord;
use sync_token_core::{
    DocumentHost, InMemoryHost, SettingsStore, SyncError, SyncOutcome, SyncService,
    TokenDocument, WorldState,
};

use super::{load_settings, load_world, CliResult};

const HOST_REJECTED: &str = "skipped:host_rejected";

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// World snapshot (JSON)
    #[arg(long)]
    pub world: PathBuf,

    /// Event log (JSON array)
    #[arg(long)]
    pub events: PathBuf,

    /// Settings file (TOML); registered defaults when omitted
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

/// One host notification
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayEvent {
    #[serde(rename_all = "camelCase")]
    ActorUpdated {
        actor_id: String,
        changes: Value,
        /// Defaults to the world's current user
        #[serde(default)]
        user_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    TokenPreCreate { token: TokenDocument },
    #[serde(rename_all = "camelCase")]
    ToggleForceSync { actor_id: String },
    #[serde(rename_all = "camelCase")]
    SyncImageNow { actor_id: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub index: usize,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutput {
    pub steps: Vec<StepResult>,
    pub writes: Vec<WriteRecord>,
    pub world: WorldState,
}

pub fn execute(args: ReplayArgs) -> CliResult {
    let host = Arc::new(load_world(&args.world)?);
    let settings: Arc<dyn SettingsStore> = Arc::new(load_settings(args.settings.as_ref())?);

    let text = std::fs::read_to_string(&args.events)
        .map_err(|e| format!("cannot read events {}: {}", args.events.display(), e))?;
    let events: Vec<ReplayEvent> = serde_json::from_str(&text)
        .map_err(|e| format!("invalid events {}: {}", args.events.display(), e))?;

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let output = runtime.block_on(replay(host, settings, events))?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Run `events` against `host`, returning per-step outcomes and the final world
pub async fn replay(
    host: Arc<InMemoryHost>,
    settings: Arc<dyn SettingsStore>,
    events: Vec<ReplayEvent>,
) -> Result<ReplayOutput, Box<dyn std::error::Error>> {
    let host_dyn: Arc<dyn DocumentHost> = host.clone();
    let service = SyncService::new(host_dyn, settings);
    let mut steps = Vec::with_capacity(events.len());

    for (index, event) in events.into_iter().enumerate() {
        let outcome = match event {
            ReplayEvent::ActorUpdated {
                actor_id,
                changes,
                user_id,
            } => {
                let actor = match host.apply_actor_change(&actor_id, &changes) {
                    Ok(actor) => actor,
                    Err(SyncError::PersistenceFailure { .. }) => {
                        steps.push(StepResult {
                            index,
                            outcome: HOST_REJECTED.to_string(),
                            writes: None,
                            failures: None,
                        });
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                };
                let user_id = user_id.or_else(|| host.current_user()).unwrap_or_default();
                service.on_actor_updated(&actor, &changes, &user_id).await
            }
            ReplayEvent::TokenPreCreate { mut token } => {
                let outcome = service.on_token_pre_create(&mut token);
                host.create_token(token)?;
                outcome
            }
            ReplayEvent::ToggleForceSync { actor_id } => {
                let actor = known_actor(&host, &actor_id)?;
                let value = service.toggle_force_sync(&actor).await;
                steps.push(StepResult {
                    index,
                    outcome: format!("force_sync:{}", value),
                    writes: None,
                    failures: None,
                });
                continue;
            }
            ReplayEvent::SyncImageNow { actor_id } => {
                let actor = known_actor(&host, &actor_id)?;
                service.sync_image_now(&actor).await
            }
        };
        steps.push(step(index, outcome));
    }

    Ok(ReplayOutput {
        steps,
        writes: host.writes(),
        world: host.world(),
    })
}

fn known_actor(
    host: &InMemoryHost,
    actor_id: &str,
) -> Result<sync_token_core::Actor, Box<dyn std::error::Error>> {
    host.actor(actor_id)
        .ok_or_else(|| format!("unknown actor {}", actor_id).into())
}

fn step(index: usize, outcome: SyncOutcome) -> StepResult {
    match outcome {
        SyncOutcome::Committed(report) => StepResult {
            index,
            outcome: "committed".to_string(),
            writes: Some(report.writes),
            failures: Some(report.failures),
        },
        SyncOutcome::Seeded => StepResult {
            index,
            outcome: "seeded".to_string(),
            writes: None,
            failures: None,
        },
        SyncOutcome::Skipped(reason) => StepResult {
            index,
            outcome: format!("skipped:{}", reason.as_str()),
            writes: None,
            failures: None,
        },
    }
}
