//! The per-actor `alwaysSync` override flag
//!
//! Reads walk a fixed chain: host flag API, then the raw `flags` field of the
//! actor snapshot, then `false`. Writes try the host flag API first and fall
//! back to a raw update document. Neither direction ever returns an error.

use serde_json::Value;

use crate::host::DocumentHost;
use crate::model::{Actor, DocumentUpdate};
use crate::policy::MODULE_ID;

/// Flag key of the force-sync override
pub const ALWAYS_SYNC: &str = "alwaysSync";

/// Whether `actor` has the force-sync override switched on
pub fn read_override(host: &dyn DocumentHost, actor: &Actor) -> bool {
    let value = match host.get_flag(actor, MODULE_ID, ALWAYS_SYNC) {
        Ok(value) => value,
        Err(err) => match actor.raw_flag(MODULE_ID, ALWAYS_SYNC) {
            Some(raw) => Some(raw.clone()),
            None => {
                tracing::warn!(
                    actor_id = %actor.id,
                    error = %err,
                    "failed to read override flag, is the module active?"
                );
                None
            }
        },
    };
    flag_as_bool(&actor.id, value)
}

fn flag_as_bool(actor_id: &str, value: Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(other) => {
            tracing::warn!(actor_id, value = %other, "override flag is not a boolean");
            false
        }
    }
}

/// Persist the force-sync override for `actor`
///
/// Returns whether the value was persisted by either path.
pub async fn write_override(host: &dyn DocumentHost, actor: &Actor, value: bool) -> bool {
    let err = match host
        .set_flag(&actor.id, MODULE_ID, ALWAYS_SYNC, Value::Bool(value))
        .await
    {
        Ok(()) => return true,
        Err(err) => err,
    };
    tracing::warn!(
        actor_id = %actor.id,
        error = %err,
        "set_flag failed, falling back to direct update"
    );

    let mut update = DocumentUpdate::new();
    update.set(format!("flags.{MODULE_ID}.{ALWAYS_SYNC}"), Value::Bool(value));
    match host.update_actor(&actor.id, update).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(actor_id = %actor.id, error = %err, "override flag not persisted");
            false
        }
    }
}
