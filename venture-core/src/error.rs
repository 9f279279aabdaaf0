//! Error types for Venture operations

use crate::enums::{AgentRole, EntityType};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Artifact version conflict for project {project_id}, family {family}: version {version} already exists")]
    VersionConflict {
        project_id: Uuid,
        family: String,
        version: i32,
    },

    #[error("Invalid artifact status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Token ledger errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Token quota exceeded for user {user_id}: used {used} of {limit}, requested {requested}")]
    QuotaExceeded {
        user_id: Uuid,
        used: i64,
        limit: i64,
        requested: i64,
    },

    #[error("Unknown reservation {reservation_id}")]
    UnknownReservation { reservation_id: Uuid },

    #[error("Account {user_id} is deactivated")]
    AccountInactive { user_id: Uuid },
}

/// Completion provider errors.
///
/// `transient` marks failures worth retrying (timeouts, transport errors,
/// rate limiting); non-transient failures (rejected requests, malformed
/// responses) fail the hop immediately.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("No completion provider configured")]
    NotConfigured,

    #[error("Request to {provider} failed (transient: {transient}): {message}")]
    RequestFailed {
        provider: String,
        transient: bool,
        message: String,
    },

    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ProviderError {
    /// Whether the engine should retry the call.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::NotConfigured => false,
            ProviderError::RequestFailed { transient, .. } => *transient,
            ProviderError::Timeout { .. } => true,
            ProviderError::RateLimited { .. } => true,
            ProviderError::InvalidResponse { .. } => false,
        }
    }
}

/// Orchestration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Agent {role} invocation failed after {attempts} attempts: {reason}")]
    InvocationExhausted {
        role: AgentRole,
        attempts: u32,
        reason: String,
    },

    #[error("Artifact version conflict persisted after retry for family {family}")]
    VersionConflictPersisted { family: String },

    #[error("Conversation {conversation_id} does not belong to project {project_id}")]
    ConversationProjectMismatch {
        conversation_id: Uuid,
        project_id: Uuid,
    },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Authorization errors. Never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("User {user_id} is not authorized to {action}")]
    Forbidden { user_id: Uuid, action: String },

    #[error("Account {user_id} is deactivated")]
    AccountDeactivated { user_id: Uuid },

    #[error("Admin role required")]
    AdminRequired,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Venture errors.
#[derive(Debug, Clone, Error)]
pub enum VentureError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Venture operations.
pub type VentureResult<T> = Result<T, VentureError>;

// =============================================================================
// TESTS
// =============================================================================
