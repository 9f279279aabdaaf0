//! Admin REST API Routes
//!
//! Account management and usage oversight. Every handler requires the admin
//! role; authorization failures are terminal and never retried.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use venture_core::{User, UserId};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{AdminStats, AdminUserRow, UpdateLimitRequest, UpdateStatusRequest};

async fn user_row(state: &AppState, user: User) -> ApiResult<AdminUserRow> {
    let project_count = state
        .storage
        .list_projects_for_owner(user.user_id)
        .await?
        .len();
    Ok(AdminUserRow {
        user_id: user.user_id,
        email: user.email,
        name: user.name,
        role: user.role,
        is_active: user.is_active,
        tokens_used: user.tokens_used,
        token_limit: user.token_limit,
        project_count,
        created_at: user.created_at,
    })
}

/// GET /admin/users - All accounts with usage and project counts.
pub async fn list_users(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    caller.require_admin()?;

    let users = state.storage.list_users().await?;
    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        rows.push(user_row(&state, user).await?);
    }
    Ok(Json(rows))
}

/// GET /admin/users/{id} - One account with usage and project count.
pub async fn get_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<impl IntoResponse> {
    caller.require_admin()?;

    let user = state.storage.get_user(user_id).await?;
    Ok(Json(user_row(&state, user).await?))
}

/// PATCH /admin/users/{id}/limit - Change a user's token cap.
pub async fn update_limit(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<UserId>,
    Json(req): Json<UpdateLimitRequest>,
) -> ApiResult<impl IntoResponse> {
    caller.require_admin()?;
    if req.token_limit <= 0 {
        return Err(ApiError::invalid_input("token_limit must be positive"));
    }

    let user = state
        .storage
        .set_token_limit(user_id, req.token_limit)
        .await?;
    Ok(Json(user))
}

/// POST /admin/users/{id}/reset-tokens - Zero a user's committed usage.
pub async fn reset_tokens(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<UserId>,
) -> ApiResult<impl IntoResponse> {
    caller.require_admin()?;

    let user = state.storage.reset_tokens(user_id).await?;
    Ok(Json(user))
}

/// PATCH /admin/users/{id}/status - Activate or deactivate an account.
///
/// Deactivating your own account or another admin is rejected.
pub async fn update_status(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(user_id): Path<UserId>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    caller.require_admin()?;

    if !req.is_active {
        if user_id == caller.0.user_id {
            return Err(ApiError::invalid_input(
                "Cannot deactivate your own account",
            ));
        }
        let target = state.storage.get_user(user_id).await?;
        if target.is_admin() {
            return Err(ApiError::invalid_input(
                "Cannot deactivate an admin account",
            ));
        }
    }

    let user = state.storage.set_user_active(user_id, req.is_active).await?;
    Ok(Json(user))
}

/// GET /admin/stats - Platform totals.
pub async fn stats(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    caller.require_admin()?;

    let users = state.storage.list_users().await?;
    let total_projects = state.storage.count_projects().await?;
    let stats = AdminStats {
        total_users: users.len(),
        active_users: users.iter().filter(|u| u.is_active).count(),
        total_projects,
        total_tokens_used: users.iter().map(|u| u.tokens_used).sum(),
    };
    Ok(Json(stats))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/limit", patch(update_limit))
        .route("/users/:id/reset-tokens", post(reset_tokens))
        .route("/users/:id/status", patch(update_status))
        .route("/stats", get(stats))
}
