//! Storage contracts.
//!
//! Each trait covers one aggregate; `MemoryStorage` implements them all.
//! The contracts carry the semantics the engine depends on: append-only
//! transcripts, immutable communications with per-conversation sequence
//! numbers, per-family contiguous artifact versions, and an atomic
//! reserve/commit/release token ledger.

use async_trait::async_trait;
use uuid::Uuid;
use venture_core::{
    AgentCommunication, AgentRole, AgentRoleConfig, Artifact, ArtifactId, ArtifactStatus,
    ArtifactType, Conversation, ConversationId, Decision, DecisionId, Message, NewArtifact,
    NewCommunication, Project, ProjectId, TokenLedgerEntry, User, UserId, VentureResult,
};

// ============================================================================
// USERS
// ============================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> VentureResult<User>;
    async fn get_user(&self, user_id: UserId) -> VentureResult<User>;
    async fn get_user_by_email(&self, email: &str) -> VentureResult<User>;
    async fn list_users(&self) -> VentureResult<Vec<User>>;

    /// Activate or deactivate an account.
    async fn set_user_active(&self, user_id: UserId, active: bool) -> VentureResult<User>;
}

// ============================================================================
// PROJECTS
// ============================================================================

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: Project) -> VentureResult<Project>;
    async fn get_project(&self, project_id: ProjectId) -> VentureResult<Project>;
    async fn list_projects_for_owner(&self, owner_id: UserId) -> VentureResult<Vec<Project>>;
    async fn count_projects(&self) -> VentureResult<usize>;
}

// ============================================================================
// CONVERSATIONS & TRANSCRIPT
// ============================================================================

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Fetch an existing conversation, or create a fresh one for the project
    /// when no id is given. An unknown explicit id is `NotFound`, never an
    /// implicit create.
    async fn get_or_create_conversation(
        &self,
        project_id: ProjectId,
        conversation_id: Option<ConversationId>,
        title_seed: &str,
    ) -> VentureResult<Conversation>;

    async fn get_conversation(&self, conversation_id: ConversationId)
        -> VentureResult<Conversation>;

    async fn list_conversations(&self, project_id: ProjectId) -> VentureResult<Vec<Conversation>>;

    /// Append one transcript message. The transcript is append-only.
    async fn append_message(&self, message: Message) -> VentureResult<Message>;

    /// Full transcript in insertion order.
    async fn history(&self, conversation_id: ConversationId) -> VentureResult<Vec<Message>>;

    /// Persist the sticky agent. Called only after a turn commits.
    async fn set_current_agent(
        &self,
        conversation_id: ConversationId,
        agent: AgentRole,
    ) -> VentureResult<()>;
}

// ============================================================================
// COMMUNICATION LOG
// ============================================================================

#[async_trait]
pub trait CommunicationLog: Send + Sync {
    /// Append one record, assigning the next per-conversation sequence
    /// number atomically with the insert. Records are immutable; there are
    /// no update or delete operations.
    async fn append_communication(
        &self,
        comm: NewCommunication,
    ) -> VentureResult<AgentCommunication>;

    /// Records for a conversation in sequence order, optionally bounded to
    /// the most recent `limit`.
    async fn list_communications(
        &self,
        conversation_id: ConversationId,
        limit: Option<usize>,
    ) -> VentureResult<Vec<AgentCommunication>>;

    /// Records across a whole project, oldest first.
    async fn list_project_communications(
        &self,
        project_id: ProjectId,
        limit: Option<usize>,
    ) -> VentureResult<Vec<AgentCommunication>>;
}

// ============================================================================
// ARTIFACTS
// ============================================================================

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Append a new version: atomically `max(version in family) + 1`,
    /// status `Draft`. A concurrent collision surfaces as
    /// `StorageError::VersionConflict`; the caller retries once.
    async fn create_artifact_version(&self, draft: NewArtifact) -> VentureResult<Artifact>;

    async fn get_artifact(&self, artifact_id: ArtifactId) -> VentureResult<Artifact>;

    /// Highest version per family, optionally filtered to one family.
    async fn latest_artifacts(
        &self,
        project_id: ProjectId,
        artifact_type: Option<ArtifactType>,
    ) -> VentureResult<Vec<Artifact>>;

    /// All versions of one family, oldest first.
    async fn artifact_versions(
        &self,
        project_id: ProjectId,
        artifact_type: ArtifactType,
    ) -> VentureResult<Vec<Artifact>>;

    /// Status transition. Forward-only; backward moves are
    /// `StorageError::InvalidTransition`.
    async fn transition_artifact(
        &self,
        artifact_id: ArtifactId,
        status: ArtifactStatus,
    ) -> VentureResult<Artifact>;
}

// ============================================================================
// TOKEN LEDGER
// ============================================================================

/// A hold on a user's token budget. Consumed by `commit` or `release`; the
/// engine must resolve every reservation on all paths out of a hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub reservation_id: Uuid,
    pub user_id: UserId,
    pub amount: i64,
}

/// Attribution for a committed charge.
#[derive(Debug, Clone, Copy)]
pub struct ChargeScope {
    pub project_id: ProjectId,
    pub conversation_id: ConversationId,
    pub agent: AgentRole,
}

#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Place a hold. Admits iff
    /// `tokens_used + outstanding_holds + estimate <= token_limit`, checked
    /// and recorded as one atomic step per user. A deactivated account is
    /// rejected outright.
    async fn reserve(&self, user_id: UserId, estimate: i64) -> VentureResult<Reservation>;

    /// Replace a hold with a durable charge and append a ledger entry. The
    /// charge is `min(input + output, limit - used)` so `tokens_used` never
    /// passes the cap; the entry records the raw counts alongside.
    async fn commit(
        &self,
        reservation: Reservation,
        input_tokens: i64,
        output_tokens: i64,
        scope: ChargeScope,
    ) -> VentureResult<TokenLedgerEntry>;

    /// Drop a hold without charging.
    async fn release(&self, reservation: Reservation) -> VentureResult<()>;

    /// Committed usage and limit for a user: `(tokens_used, token_limit)`.
    async fn usage(&self, user_id: UserId) -> VentureResult<(i64, i64)>;

    /// Ledger entries for a user, oldest first.
    async fn ledger_entries(&self, user_id: UserId) -> VentureResult<Vec<TokenLedgerEntry>>;

    /// Admin: change the cap.
    async fn set_token_limit(&self, user_id: UserId, limit: i64) -> VentureResult<User>;

    /// Admin: zero the committed usage, restoring full headroom.
    async fn reset_tokens(&self, user_id: UserId) -> VentureResult<User>;
}

// ============================================================================
// DECISIONS
// ============================================================================

#[async_trait]
pub trait DecisionStore: Send + Sync {
    async fn insert_decision(&self, decision: Decision) -> VentureResult<Decision>;
    async fn get_decision(&self, decision_id: DecisionId) -> VentureResult<Decision>;

    /// Record the user's choice on a pending decision.
    async fn resolve_decision(
        &self,
        decision_id: DecisionId,
        chosen_option: &str,
        reasoning: Option<String>,
    ) -> VentureResult<Decision>;

    async fn list_pending_decisions(&self, project_id: ProjectId)
        -> VentureResult<Vec<Decision>>;
}

// ============================================================================
// ROLE CONFIG
// ============================================================================

#[async_trait]
pub trait RoleConfigStore: Send + Sync {
    /// Config row for a role; a default row when none was ever written.
    async fn get_role_config(&self, role: AgentRole) -> VentureResult<AgentRoleConfig>;

    async fn list_role_configs(&self) -> VentureResult<Vec<AgentRoleConfig>>;

    async fn update_role_config(
        &self,
        role: AgentRole,
        custom_prompt: Option<String>,
        use_custom_prompt: bool,
    ) -> VentureResult<AgentRoleConfig>;

    /// Drop any override, returning the role to its built-in prompt.
    async fn reset_role_config(&self, role: AgentRole) -> VentureResult<AgentRoleConfig>;
}

/// Everything the engine and the boundary need, under one object.
pub trait Storage:
    UserStore
    + ProjectStore
    + ConversationStore
    + CommunicationLog
    + ArtifactStore
    + TokenLedger
    + DecisionStore
    + RoleConfigStore
{
}

impl<T> Storage for T where
    T: UserStore
        + ProjectStore
        + ConversationStore
        + CommunicationLog
        + ArtifactStore
        + TokenLedger
        + DecisionStore
        + RoleConfigStore
{
}
