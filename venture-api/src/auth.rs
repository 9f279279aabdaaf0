//! Caller identity resolution.
//!
//! Identity arrives as an `x-user-id` header carrying the user's UUID;
//! session issuance lives outside this service. The extractor resolves the
//! user row and rejects unknown or deactivated accounts, so handlers always
//! see a live user.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use venture_core::{Project, User, UserId};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The resolved caller. Present in a handler's signature means the request
/// passed identity resolution.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Reject non-admin callers.
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(ApiError::from_code(ErrorCode::AdminRequired))
        }
    }

    /// Reject callers that do not own the project.
    pub fn require_project_owner(&self, project: &Project) -> ApiResult<()> {
        if project.owner_id == self.0.user_id {
            Ok(())
        } else {
            Err(ApiError::forbidden("Project belongs to another user"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing x-user-id header"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("Malformed x-user-id header"))?;

        let user_id: UserId = raw
            .parse()
            .map_err(|_| ApiError::unauthorized("x-user-id is not a valid UUID"))?;

        let user = state
            .storage
            .get_user(user_id)
            .await
            .map_err(|_| ApiError::unauthorized("Unknown user"))?;

        if !user.is_active {
            return Err(ApiError::from_code(ErrorCode::AccountDeactivated));
        }

        Ok(CurrentUser(user))
    }
}
