use sync_token_core_types::PassId;
use thiserror::Error;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in structured logs and by
/// tests. None of these kinds is ever fatal to the host: every failure
/// degrades to "sync did not happen this time".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Acting user lacks owner rights on the actor
    PermissionDenied,
    /// An update or batch-update call was rejected by the host
    Persistence,
    /// The override flag could not be read through the primary path
    FlagRead,
    /// Referenced actor, scene or token is absent
    NotFound,
    /// A setting value has the wrong type or an unknown choice
    InvalidSetting,
    /// Settings file could not be read or parsed
    Config,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::PermissionDenied => "ERR_PERMISSION_DENIED",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::FlagRead => "ERR_FLAG_READ",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidSetting => "ERR_INVALID_SETTING",
            ExErrorKind::Config => "ERR_CONFIG",
        }
    }
}

/// Structured error carrying a kind plus optional context
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    pass_id: Option<PassId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            pass_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add sync pass context
    pub fn with_pass_id(mut self, pass_id: PassId) -> Self {
        self.pass_id = Some(pass_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn pass_id(&self) -> Option<&PassId> {
        self.pass_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for sync operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Acting user is not an owner of the actor
    #[error("User {user_id} lacks owner permission on actor {actor_id}")]
    PermissionDenied { actor_id: String, user_id: String },

    /// A document update was rejected by the host
    #[error("Update of {target} failed: {reason}")]
    PersistenceFailure { target: String, reason: String },

    /// The override flag could not be read via the host flag API
    #[error("Failed to read flag {namespace}.{key} on actor {actor_id}: {reason}")]
    FlagReadFailure {
        actor_id: String,
        namespace: String,
        key: String,
        reason: String,
    },

    /// A referenced document is absent
    #[error("{kind} not found: {id}")]
    MissingReference { kind: &'static str, id: String },

    /// A setting value does not fit its key
    #[error("Invalid value for setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Settings file I/O or parse failure
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<SyncError> for ExError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::PermissionDenied { actor_id, user_id } => {
                ExError::new(ExErrorKind::PermissionDenied)
                    .with_entity_id(actor_id)
                    .with_message(format!("user {} is not an owner", user_id))
            }
            SyncError::PersistenceFailure { target, reason } => {
                ExError::new(ExErrorKind::Persistence)
                    .with_entity_id(target)
                    .with_message(reason)
            }
            SyncError::FlagReadFailure {
                actor_id,
                namespace,
                key,
                reason,
            } => ExError::new(ExErrorKind::FlagRead)
                .with_entity_id(actor_id)
                .with_op("read_flag")
                .with_message(format!("{}.{}: {}", namespace, key, reason)),
            SyncError::MissingReference { kind, id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(id)
                .with_message(format!("{} not found", kind)),
            SyncError::InvalidSetting { key, reason } => {
                ExError::new(ExErrorKind::InvalidSetting)
                    .with_entity_id(key)
                    .with_message(reason)
            }
            SyncError::Config(reason) => ExError::new(ExErrorKind::Config).with_message(reason),
        }
    }
}

impl From<&SyncError> for ExError {
    fn from(err: &SyncError) -> Self {
        err.clone().into()
    }
}
