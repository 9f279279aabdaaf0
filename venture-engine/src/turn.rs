//! Turn request/outcome types and the turn state machine states.

use serde::{Deserialize, Serialize};
use venture_core::{
    AgentCommunication, AgentRole, Artifact, ArtifactType, ConversationId, DecisionOption,
    ProjectId, UserId,
};
use venture_llm::TokenUsage;

/// One user message submitted for orchestration.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user_id: UserId,
    pub project_id: ProjectId,
    /// Existing thread to continue, or `None` to start a fresh one.
    pub conversation_id: Option<ConversationId>,
    pub content: String,
}

/// Committed tokens for a user after the turn: `(used, limit)` view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTokens {
    pub used: i64,
    pub limit: i64,
}

/// Result of a committed turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// The combined reply shown to the user. Per-hop replies are persisted
    /// individually in the transcript; this is their presentation form.
    pub message: String,
    pub conversation_id: ConversationId,
    /// The agent that led the turn; also the sticky agent for the next one.
    pub agent: AgentRole,
    pub needs_decision: bool,
    pub decision_options: Vec<DecisionOption>,
    /// Communications appended during this turn, in sequence order.
    pub communications: Vec<AgentCommunication>,
    /// Artifacts created during this turn.
    pub artifacts: Vec<Artifact>,
    /// Provider usage summed over the turn's committed hops.
    pub usage: TokenUsage,
    pub user_tokens: UserTokens,
}

/// States of the per-turn machine. Terminal states are `Committed` and
/// `Failed`; `Escalated` commits the turn with a pending decision attached.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    /// Resolve the entry agent for the turn.
    SelectAgent,
    /// A provider call for `role` is in flight (with retries).
    AwaitingAgent { role: AgentRole, prompt: String },
    /// The reply answers the user; commit.
    ReplyReady,
    /// The reply hands off to another role.
    Delegating {
        from: AgentRole,
        to: AgentRole,
        instructions: String,
    },
    /// The reply asks a role to produce a document.
    ArtifactPending {
        requested_by: AgentRole,
        artifact_type: ArtifactType,
        instructions: String,
    },
    /// The turn surfaces a decision to the user.
    Escalated {
        by: AgentRole,
        options: Vec<DecisionOption>,
        ambiguous: bool,
    },
}

impl TurnState {
    /// Short name for structured logging.
    pub fn name(&self) -> &'static str {
        match self {
            TurnState::SelectAgent => "select_agent",
            TurnState::AwaitingAgent { .. } => "awaiting_agent",
            TurnState::ReplyReady => "reply_ready",
            TurnState::Delegating { .. } => "delegating",
            TurnState::ArtifactPending { .. } => "artifact_pending",
            TurnState::Escalated { .. } => "escalated",
        }
    }
}
