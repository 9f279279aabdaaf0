//! Persisted entities of the Venture domain.
//!
//! All entities are plain data with `new` constructors that assign a
//! timestamp-ordered id, plus `with_*` builders for optional fields.
//! Mutation rules (append-only transcripts, immutable communications and
//! artifact rows) are enforced by the storage contracts, not here.

use crate::enums::{
    AgentRole, ArtifactStatus, ArtifactType, CommunicationKind, DecisionStatus, MessageRole,
    ProjectStatus, UserRole,
};
use crate::identity::{
    compute_content_hash, now, ArtifactId, CommunicationId, ContentHash, ConversationId,
    DecisionId, EntityIdType, LedgerEntryId, MessageId, ProjectId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

/// Default per-user token budget for new accounts.
pub const DEFAULT_TOKEN_LIMIT: i64 = 25_000;

/// Conversation titles are derived from the first user message, truncated.
pub const CONVERSATION_TITLE_LEN: usize = 50;

// ============================================================================
// USER
// ============================================================================

/// A founder or admin account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    /// Hard cap on cumulative charged tokens.
    pub token_limit: i64,
    /// Cumulative charged tokens. Never exceeds `token_limit` at any
    /// committed observation.
    pub tokens_used: i64,
    pub created_at: Timestamp,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: UserId::now_v7(),
            email: email.into(),
            name: name.into(),
            role: UserRole::User,
            is_active: true,
            token_limit: DEFAULT_TOKEN_LIMIT,
            tokens_used: 0,
            created_at: now(),
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_token_limit(mut self, limit: i64) -> Self {
        self.token_limit = limit;
        self
    }

    /// Tokens still available before the cap.
    pub fn tokens_remaining(&self) -> i64 {
        (self.token_limit - self.tokens_used).max(0)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// ============================================================================
// PROJECT
// ============================================================================

/// Business context attached to a project; rendered into agent prompts
/// verbatim. The engine never branches on any of these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectContext {
    pub business_goal: Option<String>,
    pub target_audience: Option<String>,
    pub arpu_usd: Option<f64>,
    pub estimated_cac_usd: Option<f64>,
    pub estimated_ltv_usd: Option<f64>,
    /// Delivery speed priority, 1-10.
    pub speed_priority: i32,
    /// Output quality priority, 1-10.
    pub quality_priority: i32,
    /// Cost sensitivity, 1-10.
    pub cost_priority: i32,
}

impl ProjectContext {
    pub fn new() -> Self {
        Self {
            business_goal: None,
            target_audience: None,
            arpu_usd: None,
            estimated_cac_usd: None,
            estimated_ltv_usd: None,
            speed_priority: 5,
            quality_priority: 5,
            cost_priority: 5,
        }
    }

    /// LTV:CAC ratio when both inputs are present and CAC is non-zero.
    pub fn ltv_cac_ratio(&self) -> Option<f64> {
        match (self.estimated_ltv_usd, self.estimated_cac_usd) {
            (Some(ltv), Some(cac)) if cac > 0.0 => Some(ltv / cac),
            _ => None,
        }
    }
}

/// A product idea being co-developed with the agent panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub context: ProjectContext,
    pub created_at: Timestamp,
}

impl Project {
    pub fn new(owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            project_id: ProjectId::now_v7(),
            owner_id,
            name: name.into(),
            description: None,
            status: ProjectStatus::Discovery,
            context: ProjectContext::new(),
            created_at: now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_context(mut self, context: ProjectContext) -> Self {
        self.context = context;
        self
    }
}

// ============================================================================
// CONVERSATION & MESSAGES
// ============================================================================

/// A conversation thread within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: ConversationId,
    pub project_id: ProjectId,
    pub title: String,
    /// The agent that answered the last committed turn. Sticky routing
    /// target for the next turn; updated only after a turn commits.
    pub current_agent: Option<AgentRole>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl Conversation {
    pub fn new(project_id: ProjectId, title_seed: &str) -> Self {
        Self {
            conversation_id: ConversationId::now_v7(),
            project_id,
            title: derive_title(title_seed),
            current_agent: None,
            is_active: true,
            created_at: now(),
        }
    }
}

/// Derive a conversation title from the first user message.
pub fn derive_title(seed: &str) -> String {
    let trimmed = seed.trim();
    if trimmed.is_empty() {
        return "New conversation".to_string();
    }
    trimmed.chars().take(CONVERSATION_TITLE_LEN).collect()
}

/// One transcript entry. Append-only; insertion order is the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub project_id: ProjectId,
    pub role: MessageRole,
    pub content: String,
    /// Set iff `role == Assistant`: which agent authored the reply.
    pub agent: Option<AgentRole>,
    pub created_at: Timestamp,
}

impl Message {
    pub fn user(
        conversation_id: ConversationId,
        project_id: ProjectId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            message_id: MessageId::now_v7(),
            conversation_id,
            project_id,
            role: MessageRole::User,
            content: content.into(),
            agent: None,
            created_at: now(),
        }
    }

    pub fn assistant(
        conversation_id: ConversationId,
        project_id: ProjectId,
        agent: AgentRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            message_id: MessageId::now_v7(),
            conversation_id,
            project_id,
            role: MessageRole::Assistant,
            content: content.into(),
            agent: Some(agent),
            created_at: now(),
        }
    }
}

// ============================================================================
// AGENT COMMUNICATION
// ============================================================================

/// Delegation summaries in the log are truncated to this length.
pub const COMMUNICATION_SUMMARY_LEN: usize = 500;

/// One immutable inter-agent communication record.
///
/// `seq` is assigned by the log at append time, strictly increasing per
/// conversation with no gaps observable to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCommunication {
    pub communication_id: CommunicationId,
    pub conversation_id: ConversationId,
    pub project_id: ProjectId,
    pub seq: u64,
    pub from_agent: AgentRole,
    pub to_agent: AgentRole,
    pub kind: CommunicationKind,
    pub content: String,
    /// Set on `ArtifactCreated` records: the artifact the record announces.
    pub artifact_id: Option<ArtifactId>,
    pub created_at: Timestamp,
}

/// A communication before the log assigns its sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommunication {
    pub conversation_id: ConversationId,
    pub project_id: ProjectId,
    pub from_agent: AgentRole,
    pub to_agent: AgentRole,
    pub kind: CommunicationKind,
    pub content: String,
    pub artifact_id: Option<ArtifactId>,
}

impl NewCommunication {
    pub fn new(
        conversation_id: ConversationId,
        project_id: ProjectId,
        from_agent: AgentRole,
        to_agent: AgentRole,
        kind: CommunicationKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            project_id,
            from_agent,
            to_agent,
            kind,
            content: truncate_summary(&content.into()),
            artifact_id: None,
        }
    }

    pub fn with_artifact(mut self, artifact_id: ArtifactId) -> Self {
        self.artifact_id = Some(artifact_id);
        self
    }
}

/// Truncate log content to the summary length, on a char boundary.
pub fn truncate_summary(content: &str) -> String {
    content.chars().take(COMMUNICATION_SUMMARY_LEN).collect()
}

// ============================================================================
// ARTIFACT
// ============================================================================

/// One immutable artifact version. Regeneration appends a new row with the
/// next version in the (project, artifact_type) family; rows are never
/// edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: ArtifactId,
    pub project_id: ProjectId,
    pub artifact_type: ArtifactType,
    pub title: String,
    pub content: String,
    #[serde(with = "serde_bytes_hash")]
    pub content_hash: ContentHash,
    /// 1-based, contiguous within the family.
    pub version: i32,
    pub status: ArtifactStatus,
    pub created_by_agent: AgentRole,
    pub created_at: Timestamp,
}

/// An artifact before the store assigns its version.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArtifact {
    pub project_id: ProjectId,
    pub artifact_type: ArtifactType,
    pub title: String,
    pub content: String,
    pub created_by_agent: AgentRole,
}

impl NewArtifact {
    pub fn new(
        project_id: ProjectId,
        artifact_type: ArtifactType,
        title: impl Into<String>,
        content: impl Into<String>,
        created_by_agent: AgentRole,
    ) -> Self {
        Self {
            project_id,
            artifact_type,
            title: title.into(),
            content: content.into(),
            created_by_agent,
        }
    }

    /// Materialize at a version assigned by the store.
    pub fn into_artifact(self, version: i32) -> Artifact {
        let content_hash = compute_content_hash(self.content.as_bytes());
        Artifact {
            artifact_id: ArtifactId::now_v7(),
            project_id: self.project_id,
            artifact_type: self.artifact_type,
            title: self.title,
            content: self.content,
            content_hash,
            version,
            status: ArtifactStatus::Draft,
            created_by_agent: self.created_by_agent,
            created_at: now(),
        }
    }
}

/// Serialize the 32-byte content hash as lowercase hex.
mod serde_bytes_hash {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &[u8; 32], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(de)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("content hash must be 32 bytes"))
    }
}

// ============================================================================
// TOKEN LEDGER
// ============================================================================

/// One durable charge against a user's token budget.
///
/// `charged` is what was added to `tokens_used`; it equals
/// `input_tokens + output_tokens` except when the final call of an admitted
/// turn overran the remaining headroom, in which case the charge is clamped
/// to keep `tokens_used <= token_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLedgerEntry {
    pub entry_id: LedgerEntryId,
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub conversation_id: ConversationId,
    pub agent: AgentRole,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub charged: i64,
    pub created_at: Timestamp,
}

// ============================================================================
// DECISION
// ============================================================================

/// One option presented to the user on escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub label: String,
    pub description: String,
}

impl DecisionOption {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

/// A persisted escalation: the turn needs a human call before agents
/// continue. Resolved through the boundary, never by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: DecisionId,
    pub project_id: ProjectId,
    pub conversation_id: ConversationId,
    pub question: String,
    pub asked_by_agent: AgentRole,
    pub options: Vec<DecisionOption>,
    pub status: DecisionStatus,
    pub chosen_option: Option<String>,
    pub user_reasoning: Option<String>,
    pub created_at: Timestamp,
    pub decided_at: Option<Timestamp>,
}

impl Decision {
    pub fn new(
        project_id: ProjectId,
        conversation_id: ConversationId,
        asked_by_agent: AgentRole,
        question: impl Into<String>,
        options: Vec<DecisionOption>,
    ) -> Self {
        Self {
            decision_id: DecisionId::now_v7(),
            project_id,
            conversation_id,
            question: question.into(),
            asked_by_agent,
            options,
            status: DecisionStatus::Pending,
            chosen_option: None,
            user_reasoning: None,
            created_at: now(),
            decided_at: None,
        }
    }

    /// Record the user's choice. Only valid while pending.
    pub fn resolve(&mut self, chosen: impl Into<String>, reasoning: Option<String>) {
        self.status = DecisionStatus::Decided;
        self.chosen_option = Some(chosen.into());
        self.user_reasoning = reasoning;
        self.decided_at = Some(now());
    }

    pub fn is_pending(&self) -> bool {
        self.status == DecisionStatus::Pending
    }
}

// ============================================================================
// AGENT ROLE CONFIG
// ============================================================================

/// Per-role prompt override. The built-in default prompt lives in the role
/// profile registry; this row only overrides it when `use_custom_prompt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRoleConfig {
    pub role: AgentRole,
    pub custom_prompt: Option<String>,
    pub use_custom_prompt: bool,
    pub is_active: bool,
}

impl AgentRoleConfig {
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            custom_prompt: None,
            use_custom_prompt: false,
            is_active: true,
        }
    }

    /// Reset to the built-in prompt.
    pub fn reset(&mut self) {
        self.custom_prompt = None;
        self.use_custom_prompt = false;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults() {
        let user = User::new("founder@example.com", "Founder");
        assert_eq!(user.token_limit, DEFAULT_TOKEN_LIMIT);
        assert_eq!(user.tokens_used, 0);
        assert_eq!(user.role, UserRole::User);
        assert!(user.is_active);
        assert!(!user.is_admin());
        assert_eq!(user.tokens_remaining(), DEFAULT_TOKEN_LIMIT);
    }

    #[test]
    fn test_user_builders() {
        let admin = User::new("ops@example.com", "Ops")
            .with_role(UserRole::Admin)
            .with_token_limit(100_000);
        assert!(admin.is_admin());
        assert_eq!(admin.token_limit, 100_000);
    }

    #[test]
    fn test_project_context_ltv_cac_ratio() {
        let mut ctx = ProjectContext::new();
        assert_eq!(ctx.ltv_cac_ratio(), None);

        ctx.estimated_ltv_usd = Some(300.0);
        ctx.estimated_cac_usd = Some(100.0);
        assert_eq!(ctx.ltv_cac_ratio(), Some(3.0));

        ctx.estimated_cac_usd = Some(0.0);
        assert_eq!(ctx.ltv_cac_ratio(), None);
    }

    #[test]
    fn test_conversation_title_derivation() {
        let conv = Conversation::new(
            ProjectId::now_v7(),
            "I want to build a marketplace for vintage synthesizers and drum machines",
        );
        assert_eq!(conv.title.chars().count(), CONVERSATION_TITLE_LEN);
        assert!(conv.current_agent.is_none());

        assert_eq!(derive_title("   "), "New conversation");
        assert_eq!(derive_title("short"), "short");
    }

    #[test]
    fn test_message_constructors() {
        let conv = ConversationId::now_v7();
        let proj = ProjectId::now_v7();

        let user_msg = Message::user(conv, proj, "hello");
        assert_eq!(user_msg.role, MessageRole::User);
        assert!(user_msg.agent.is_none());

        let reply = Message::assistant(conv, proj, AgentRole::Business, "hi");
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.agent, Some(AgentRole::Business));
    }

    #[test]
    fn test_new_communication_truncates_content() {
        let long = "x".repeat(COMMUNICATION_SUMMARY_LEN * 2);
        let comm = NewCommunication::new(
            ConversationId::now_v7(),
            ProjectId::now_v7(),
            AgentRole::Business,
            AgentRole::TechLead,
            CommunicationKind::Delegation,
            long,
        );
        assert_eq!(comm.content.chars().count(), COMMUNICATION_SUMMARY_LEN);
    }

    #[test]
    fn test_new_artifact_into_artifact() {
        let draft = NewArtifact::new(
            ProjectId::now_v7(),
            ArtifactType::TechSpec,
            "Tech Spec",
            "## Stack\naxum + tokio",
            AgentRole::TechLead,
        );
        let artifact = draft.clone().into_artifact(3);
        assert_eq!(artifact.version, 3);
        assert_eq!(artifact.status, ArtifactStatus::Draft);
        assert_eq!(
            artifact.content_hash,
            compute_content_hash(draft.content.as_bytes())
        );
    }

    #[test]
    fn test_artifact_hash_serde_roundtrip() {
        let artifact = NewArtifact::new(
            ProjectId::now_v7(),
            ArtifactType::Prd,
            "PRD",
            "requirements",
            AgentRole::Delivery,
        )
        .into_artifact(1);
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(
            json["content_hash"].as_str().unwrap(),
            hex::encode(artifact.content_hash)
        );
        let back: Artifact = serde_json::from_value(json).unwrap();
        assert_eq!(artifact, back);

        // A hash that decodes to the wrong width is rejected.
        let mut truncated = serde_json::to_value(&artifact).unwrap();
        truncated["content_hash"] = serde_json::Value::from("abcd");
        assert!(serde_json::from_value::<Artifact>(truncated).is_err());
    }

    #[test]
    fn test_decision_resolution() {
        let mut decision = Decision::new(
            ProjectId::now_v7(),
            ConversationId::now_v7(),
            AgentRole::Business,
            "Which pricing model?",
            vec![
                DecisionOption::new("subscription", "Monthly recurring"),
                DecisionOption::new("usage", "Pay per use"),
            ],
        );
        assert!(decision.is_pending());

        decision.resolve("subscription", Some("predictable revenue".to_string()));
        assert_eq!(decision.status, DecisionStatus::Decided);
        assert_eq!(decision.chosen_option.as_deref(), Some("subscription"));
        assert!(decision.decided_at.is_some());
    }

    #[test]
    fn test_role_config_reset() {
        let mut config = AgentRoleConfig::new(AgentRole::Discovery);
        config.custom_prompt = Some("You are terse.".to_string());
        config.use_custom_prompt = true;

        config.reset();
        assert!(config.custom_prompt.is_none());
        assert!(!config.use_custom_prompt);
    }
}
