//! Agent Configuration REST API Routes
//!
//! Role listing and per-role prompt overrides. The built-in prompts live in
//! the role profile registry; storage only carries overrides.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use venture_agents::{all_profiles, profile, RoleConfigSet};
use venture_core::AgentRole;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{AgentInfo, PromptResponse, UpdatePromptRequest};

fn parse_role(raw: &str) -> ApiResult<AgentRole> {
    raw.parse()
        .map_err(|_| ApiError::invalid_input(format!("Unknown agent role '{}'", raw)))
}

async fn prompt_response(state: &AppState, role: AgentRole) -> ApiResult<PromptResponse> {
    let config = state.storage.get_role_config(role).await?;
    let set = RoleConfigSet::new(vec![config.clone()]);
    Ok(PromptResponse {
        role,
        active_prompt: set.system_prompt(role).to_string(),
        custom_prompt: config.custom_prompt,
        use_custom_prompt: config.use_custom_prompt,
    })
}

/// GET /agents/list - The agent panel.
pub async fn list_agents(_user: CurrentUser) -> ApiResult<impl IntoResponse> {
    let agents: Vec<AgentInfo> = all_profiles()
        .into_iter()
        .map(|p| AgentInfo {
            role: p.role,
            display_name: p.display_name,
            description: p.description,
        })
        .collect();
    Ok(Json(agents))
}

/// GET /agents/prompts - Effective prompt per role.
pub async fn list_prompts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let mut prompts = Vec::with_capacity(AgentRole::ALL.len());
    for role in AgentRole::ALL {
        prompts.push(prompt_response(&state, *role).await?);
    }
    Ok(Json(prompts))
}

/// GET /agents/prompts/{role} - Effective prompt for one role.
pub async fn get_prompt(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(role): Path<String>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    let role = parse_role(&role)?;
    Ok(Json(prompt_response(&state, role).await?))
}

/// PUT /agents/prompts/{role} - Set or clear a prompt override.
pub async fn update_prompt(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(role): Path<String>,
    Json(req): Json<UpdatePromptRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    let role = parse_role(&role)?;

    if req.use_custom_prompt
        && req
            .custom_prompt
            .as_deref()
            .map(|p| p.trim().is_empty())
            .unwrap_or(true)
    {
        return Err(ApiError::validation_failed(
            "use_custom_prompt requires a non-empty custom_prompt",
        ));
    }

    state
        .storage
        .update_role_config(role, req.custom_prompt, req.use_custom_prompt)
        .await?;
    Ok(Json(prompt_response(&state, role).await?))
}

/// POST /agents/prompts/{role}/reset - Return a role to its built-in prompt.
pub async fn reset_prompt(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(role): Path<String>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;
    let role = parse_role(&role)?;

    state.storage.reset_role_config(role).await?;
    let response = prompt_response(&state, role).await?;
    debug_assert_eq!(response.active_prompt, profile(role).default_prompt);
    Ok(Json(response))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/list", get(list_agents))
        .route("/prompts", get(list_prompts))
        .route("/prompts/:role", get(get_prompt).put(update_prompt))
        .route("/prompts/:role/reset", post(reset_prompt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_accepts_wire_names() {
        assert_eq!(parse_role("tech_lead").unwrap(), AgentRole::TechLead);
        assert_eq!(parse_role("business").unwrap(), AgentRole::Business);
        assert!(parse_role("cfo").is_err());
    }
}
