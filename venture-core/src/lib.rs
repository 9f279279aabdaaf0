//! VENTURE Core - Domain types for the agent orchestration engine
//!
//! Pure data: typed ids, enums, entities, the error taxonomy, and
//! orchestration configuration. No I/O and no business logic live here;
//! the storage contracts and the turn state machine are built on top of
//! these types in the sibling crates.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;

pub use config::OrchestratorConfig;
pub use entities::{
    derive_title, truncate_summary, AgentCommunication, AgentRoleConfig, Artifact, Conversation,
    Decision, DecisionOption, Message, NewArtifact, NewCommunication, Project, ProjectContext,
    TokenLedgerEntry, User, COMMUNICATION_SUMMARY_LEN, CONVERSATION_TITLE_LEN,
    DEFAULT_TOKEN_LIMIT,
};
pub use enums::{
    AgentRole, ArtifactStatus, ArtifactType, CommunicationKind, DecisionStatus, EntityType,
    MessageRole, ParseEnumError, ProjectStatus, UserRole,
};
pub use error::{
    AuthorizationError, ConfigError, LedgerError, OrchestratorError, ProviderError, StorageError,
    ValidationError, VentureError, VentureResult,
};
pub use identity::{
    compute_content_hash, now, ArtifactId, CommunicationId, ContentHash, ConversationId,
    DecisionId, EntityIdType, LedgerEntryId, MessageId, ProjectId, Timestamp, UserId,
};
