//! Decision REST API Routes
//!
//! Escalations persisted by the engine are resolved here; the engine itself
//! never decides on the user's behalf.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use venture_core::{DecisionId, ProjectId};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::ResolveDecisionRequest;

/// POST /decisions/{decision_id}/resolve - Record the user's choice on a
/// pending escalation.
pub async fn resolve_decision(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(decision_id): Path<DecisionId>,
    Json(req): Json<ResolveDecisionRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.chosen_option.trim().is_empty() {
        return Err(ApiError::missing_field("chosen_option"));
    }

    let decision = state.storage.get_decision(decision_id).await?;
    let project = state.storage.get_project(decision.project_id).await?;
    user.require_project_owner(&project)?;

    if !decision.is_pending() {
        return Err(ApiError::validation_failed("Decision is already resolved"));
    }
    if !decision
        .options
        .iter()
        .any(|o| o.label == req.chosen_option)
    {
        return Err(ApiError::invalid_input(format!(
            "'{}' is not one of the offered options",
            req.chosen_option
        )));
    }

    let resolved = state
        .storage
        .resolve_decision(decision_id, &req.chosen_option, req.reasoning)
        .await?;
    Ok(Json(resolved))
}

/// GET /decisions/pending/{project_id} - Escalations awaiting the user.
pub async fn pending_decisions(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<impl IntoResponse> {
    let project = state.storage.get_project(project_id).await?;
    user.require_project_owner(&project)?;

    let pending = state.storage.list_pending_decisions(project_id).await?;
    Ok(Json(pending))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/:decision_id/resolve", post(resolve_decision))
        .route("/pending/:project_id", get(pending_decisions))
}
