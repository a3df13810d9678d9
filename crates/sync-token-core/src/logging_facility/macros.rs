//! Canonical logging macros
//!
//! Every sync operation logs through these so that `component`, `op` and
//! `event` are always present and spelled the same way.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use sync_token_core::log_op_start;
/// log_op_start!("actor_updated");
/// log_op_start!("actor_updated", actor_id = "a1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::sync_token_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::sync_token_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use sync_token_core::log_op_end;
/// log_op_end!("actor_updated", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::sync_token_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::sync_token_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is converted into an [`ExError`](crate::errors::ExError) so the
/// stable code ends up in `err.code`.
///
/// ```
/// # use sync_token_core::{log_op_error, errors::SyncError};
/// let err = SyncError::MissingReference { kind: "actor", id: "a1".to_string() };
/// log_op_error!("token_pre_create", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::sync_token_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = %ex_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::sync_token_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = %ex_err,
            $($field)*
        );
    }};
}

/// Log that an operation was deliberately not performed
///
/// ```
/// # use sync_token_core::log_op_skip;
/// log_op_skip!("actor_updated", reason = "not_owner");
/// ```
#[macro_export]
macro_rules! log_op_skip {
    ($op:expr, reason = $reason:expr) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::sync_token_core_types::schema::EVENT_SKIPPED,
            reason = $reason,
        );
    };
    ($op:expr, reason = $reason:expr, $($field:tt)*) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::sync_token_core_types::schema::EVENT_SKIPPED,
            reason = $reason,
            $($field)*
        );
    };
}
