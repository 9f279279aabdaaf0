//! VENTURE API - HTTP boundary
//!
//! Axum REST surface over the orchestration engine and storage: chat turns,
//! transcript and communication-log reads, artifact lifecycle, escalation
//! decisions, agent prompt configuration, and the admin panel. Caller
//! identity arrives as an `x-user-id` header; session issuance lives outside
//! this service.

pub mod auth;
pub mod config;
pub mod error;
pub mod macros;
pub mod routes;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use auth::{CurrentUser, USER_ID_HEADER};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
