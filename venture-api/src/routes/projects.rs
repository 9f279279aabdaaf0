//! Project REST API Routes
//!
//! Minimal project management so the rest of the surface is exercisable.
//! Every read is scoped to the caller's own projects.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use venture_core::{Project, ProjectId};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::CreateProjectRequest;

/// POST /projects - Create a project owned by the caller.
pub async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }

    let mut project = Project::new(user.0.user_id, req.name.trim());
    if let Some(description) = req.description {
        project = project.with_description(description);
    }
    if let Some(context) = req.context {
        project = project.with_context(context);
    }

    let project = state.storage.insert_project(project).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects - The caller's projects.
pub async fn list_projects(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let projects = state
        .storage
        .list_projects_for_owner(user.0.user_id)
        .await?;
    Ok(Json(projects))
}

/// GET /projects/{id} - One project, ownership enforced.
pub async fn get_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<impl IntoResponse> {
    let project = state.storage.get_project(project_id).await?;
    user.require_project_owner(&project)?;
    Ok(Json(project))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route("/:id", get(get_project))
}
