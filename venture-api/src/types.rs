//! Request and response types for the REST surface.
//!
//! Entities that already serialize cleanly (conversations, messages,
//! communications, artifacts, decisions) cross the boundary as-is; the types
//! here cover request bodies and the few responses that aggregate across
//! entities.

use serde::{Deserialize, Serialize};
use venture_core::{
    AgentRole, ArtifactStatus, ArtifactType, ConversationId, ProjectContext, ProjectId, Timestamp,
    UserId, UserRole,
};

// ============================================================================
// CHAT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub project_id: ProjectId,
    pub content: String,
    /// Continue an existing thread, or omit to start a fresh one.
    pub conversation_id: Option<ConversationId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub conversation_id: Option<ConversationId>,
}

// ============================================================================
// COMMUNICATIONS & ARTIFACTS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CommunicationsQuery {
    pub conversation_id: Option<ConversationId>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsQuery {
    pub artifact_type: Option<ArtifactType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionArtifactRequest {
    pub status: ArtifactStatus,
}

// ============================================================================
// PROJECTS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub context: Option<ProjectContext>,
}

// ============================================================================
// DECISIONS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveDecisionRequest {
    pub chosen_option: String,
    pub reasoning: Option<String>,
}

// ============================================================================
// ADMIN
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLimitRequest {
    pub token_limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

/// One row of the admin user listing: account plus usage.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUserRow {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub tokens_used: i64,
    pub token_limit: i64,
    pub project_count: usize,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub total_users: usize,
    pub active_users: usize,
    pub total_projects: usize,
    pub total_tokens_used: i64,
}

// ============================================================================
// AGENT CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub role: AgentRole,
    pub display_name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptResponse {
    pub role: AgentRole,
    /// The prompt currently in effect for the role.
    pub active_prompt: String,
    pub custom_prompt: Option<String>,
    pub use_custom_prompt: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePromptRequest {
    pub custom_prompt: Option<String>,
    pub use_custom_prompt: bool,
}

// ============================================================================
// HEALTH
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}
