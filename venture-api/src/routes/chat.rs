//! Chat REST API Routes
//!
//! The message endpoint is the single entry point into the orchestration
//! engine; history and conversation listing are plain reads.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use venture_core::ProjectId;
use venture_engine::TurnRequest;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{ChatRequest, HistoryQuery};

/// POST /chat/message - Run one turn through the agent panel.
///
/// Returns 403 with a `QUOTA_EXCEEDED` code when the ledger rejects the
/// turn before any agent is invoked.
pub async fn post_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.content.trim().is_empty() {
        return Err(ApiError::missing_field("content"));
    }

    let outcome = state
        .orchestrator
        .run_turn(TurnRequest {
            user_id: user.0.user_id,
            project_id: req.project_id,
            conversation_id: req.conversation_id,
            content: req.content,
        })
        .await?;

    Ok(Json(outcome))
}

/// GET /chat/history/{project_id}?conversation_id= - Ordered transcript.
pub async fn get_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<ProjectId>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let project = state.storage.get_project(project_id).await?;
    user.require_project_owner(&project)?;

    let conversation_id = query
        .conversation_id
        .ok_or_else(|| ApiError::missing_field("conversation_id"))?;
    let conversation = state.storage.get_conversation(conversation_id).await?;
    if conversation.project_id != project_id {
        return Err(ApiError::invalid_input(
            "Conversation does not belong to this project",
        ));
    }

    let messages = state.storage.history(conversation_id).await?;
    Ok(Json(messages))
}

/// GET /chat/conversations/{project_id} - Conversation summaries.
pub async fn list_conversations(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<impl IntoResponse> {
    let project = state.storage.get_project(project_id).await?;
    user.require_project_owner(&project)?;

    let conversations = state.storage.list_conversations(project_id).await?;
    Ok(Json(conversations))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/message", post(post_message))
        .route("/history/:project_id", get(get_history))
        .route("/conversations/:project_id", get(list_conversations))
}
