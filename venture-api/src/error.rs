//! Error Types for the Venture API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use venture_core::{
    AuthorizationError, LedgerError, OrchestratorError, StorageError, VentureError,
};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication / Authorization Errors (401, 403)
    // ========================================================================
    /// Request lacks a resolvable user identity
    Unauthorized,

    /// Request is authenticated but lacks permission for the resource
    Forbidden,

    /// Admin role required for this operation
    AdminRequired,

    /// The user's token budget cannot admit the request
    QuotaExceeded,

    /// The account is deactivated
    AccountDeactivated,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Concurrent artifact version collision persisted past the retry
    ConcurrentModification,

    /// Operation conflicts with current state (e.g. backward status move)
    StateConflict,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// The completion provider is unreachable or exhausted its retries
    ProviderUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,

            ErrorCode::Forbidden
            | ErrorCode::AdminRequired
            | ErrorCode::QuotaExceeded
            | ErrorCode::AccountDeactivated => StatusCode::FORBIDDEN,

            ErrorCode::ValidationFailed | ErrorCode::InvalidInput | ErrorCode::MissingField => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            ErrorCode::ConcurrentModification | ErrorCode::StateConflict => StatusCode::CONFLICT,

            ErrorCode::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::AdminRequired => "Admin role required",
            ErrorCode::QuotaExceeded => "Token quota exceeded",
            ErrorCode::AccountDeactivated => "Account is deactivated",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::ConcurrentModification => "Concurrent modification detected",
            ErrorCode::StateConflict => "Operation conflicts with current state",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::ProviderUnavailable => "Completion provider unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
///
/// Returned by all endpoints when an error occurs, giving clients a
/// consistent `{code, message, details?}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (field errors, quota numbers, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a ValidationFailed error.
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Create an EntityNotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// DOMAIN ERROR MAPPING
// ============================================================================

impl From<VentureError> for ApiError {
    fn from(err: VentureError) -> Self {
        match err {
            VentureError::Storage(e) => match e {
                StorageError::NotFound { .. } => ApiError::not_found(e.to_string()),
                StorageError::VersionConflict { .. } => {
                    ApiError::new(ErrorCode::ConcurrentModification, e.to_string())
                }
                StorageError::InvalidTransition { .. } => {
                    ApiError::new(ErrorCode::StateConflict, e.to_string())
                }
                StorageError::InsertFailed { .. } | StorageError::LockPoisoned => {
                    ApiError::internal_error(e.to_string())
                }
            },
            VentureError::Ledger(e) => match e {
                LedgerError::QuotaExceeded {
                    used,
                    limit,
                    requested,
                    ..
                } => ApiError::new(ErrorCode::QuotaExceeded, e.to_string()).with_details(
                    serde_json::json!({
                        "used": used,
                        "limit": limit,
                        "requested": requested,
                    }),
                ),
                LedgerError::AccountInactive { .. } => {
                    ApiError::new(ErrorCode::AccountDeactivated, e.to_string())
                }
                LedgerError::UnknownReservation { .. } => ApiError::internal_error(e.to_string()),
            },
            VentureError::Provider(e) => {
                let code = if e.is_transient() {
                    ErrorCode::ProviderUnavailable
                } else {
                    ErrorCode::InternalError
                };
                ApiError::new(code, e.to_string())
            }
            VentureError::Orchestrator(e) => match e {
                OrchestratorError::InvocationExhausted { .. } => {
                    ApiError::new(ErrorCode::ProviderUnavailable, e.to_string())
                }
                OrchestratorError::VersionConflictPersisted { .. } => {
                    ApiError::new(ErrorCode::ConcurrentModification, e.to_string())
                }
                OrchestratorError::ConversationProjectMismatch { .. } => {
                    ApiError::invalid_input(e.to_string())
                }
            },
            VentureError::Validation(e) => ApiError::validation_failed(e.to_string()),
            VentureError::Authorization(e) => match e {
                AuthorizationError::AdminRequired => {
                    ApiError::new(ErrorCode::AdminRequired, e.to_string())
                }
                AuthorizationError::AccountDeactivated { .. } => {
                    ApiError::new(ErrorCode::AccountDeactivated, e.to_string())
                }
                AuthorizationError::Forbidden { .. } => ApiError::forbidden(e.to_string()),
            },
            VentureError::Config(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
