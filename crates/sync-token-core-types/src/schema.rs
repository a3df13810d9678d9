//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_PASS_ID: &str = "pass_id";

// Entity identifiers
pub const FIELD_ACTOR_ID: &str = "actor_id";
pub const FIELD_TOKEN_ID: &str = "token_id";
pub const FIELD_SCENE_ID: &str = "scene_id";
pub const FIELD_USER_ID: &str = "user_id";

// Write accounting
pub const FIELD_INTENTS: &str = "intents";
pub const FIELD_WRITES: &str = "writes";
pub const FIELD_FAILURES: &str = "failures";
pub const FIELD_BATCH_LEN: &str = "batch_len";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_SKIPPED: &str = "skipped";
