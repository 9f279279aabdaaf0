//! Communication Log REST API Routes
//!
//! Read-only: the log is written exclusively by the engine during turns and
//! records are immutable once appended.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use venture_core::ProjectId;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::CommunicationsQuery;

/// GET /communications/{project_id}?conversation_id=&limit= - Ordered log.
pub async fn list_communications(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<ProjectId>,
    Query(query): Query<CommunicationsQuery>,
) -> ApiResult<impl IntoResponse> {
    let project = state.storage.get_project(project_id).await?;
    user.require_project_owner(&project)?;

    let comms = match query.conversation_id {
        Some(conversation_id) => {
            let conversation = state.storage.get_conversation(conversation_id).await?;
            if conversation.project_id != project_id {
                return Err(ApiError::invalid_input(
                    "Conversation does not belong to this project",
                ));
            }
            state
                .storage
                .list_communications(conversation_id, query.limit)
                .await?
        }
        None => {
            state
                .storage
                .list_project_communications(project_id, query.limit)
                .await?
        }
    };
    Ok(Json(comms))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/:project_id", get(list_communications))
}
