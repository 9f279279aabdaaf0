//! Artifact REST API Routes
//!
//! Artifacts are produced by agents during turns; this surface reads them
//! and moves them through the review lifecycle. Content is never edited in
//! place, so there is no update endpoint.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use venture_core::{ArtifactId, ProjectId};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{ArtifactsQuery, TransitionArtifactRequest};

/// GET /artifacts/{project_id}?artifact_type= - Latest version per family.
pub async fn latest_artifacts(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<ProjectId>,
    Query(query): Query<ArtifactsQuery>,
) -> ApiResult<impl IntoResponse> {
    let project = state.storage.get_project(project_id).await?;
    user.require_project_owner(&project)?;

    let artifacts = state
        .storage
        .latest_artifacts(project_id, query.artifact_type)
        .await?;
    Ok(Json(artifacts))
}

/// GET /artifacts/lineage/{artifact_id} - Full version lineage, oldest first.
pub async fn artifact_lineage(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(artifact_id): Path<ArtifactId>,
) -> ApiResult<impl IntoResponse> {
    let artifact = state.storage.get_artifact(artifact_id).await?;
    let project = state.storage.get_project(artifact.project_id).await?;
    user.require_project_owner(&project)?;

    let lineage = state
        .storage
        .artifact_versions(artifact.project_id, artifact.artifact_type)
        .await?;
    Ok(Json(lineage))
}

/// POST /artifacts/{artifact_id}/status - Review lifecycle transition.
///
/// Backward moves return 409.
pub async fn transition_artifact(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(artifact_id): Path<ArtifactId>,
    Json(req): Json<TransitionArtifactRequest>,
) -> ApiResult<impl IntoResponse> {
    let artifact = state.storage.get_artifact(artifact_id).await?;
    let project = state.storage.get_project(artifact.project_id).await?;
    user.require_project_owner(&project)?;

    let updated = state
        .storage
        .transition_artifact(artifact_id, req.status)
        .await?;
    Ok(Json(updated))
}

// One param name per position: matchit rejects mixed names at the same
// segment, so both project and artifact ids bind as `:id`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/lineage/:id", get(artifact_lineage))
        .route("/:id/status", post(transition_artifact))
        .route("/:id", get(latest_artifacts))
}
