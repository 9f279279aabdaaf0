//! Identity primitives: typed entity ids, timestamps, and content hashing.
//!
//! Every persisted entity is keyed by a UUIDv7, which is timestamp-sortable,
//! so insertion order and id order agree without a separate sequence column.
//! Ids are newtypes so a `ConversationId` cannot be passed where a
//! `ProjectId` is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Timestamp type used throughout Venture (UTC).
pub type Timestamp = DateTime<Utc>;

/// Content hash for artifact payloads (SHA-256).
pub type ContentHash = [u8; 32];

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Compute the SHA-256 content hash of a byte slice.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hasher.finalize().into()
}

/// Common behavior for typed entity ids.
pub trait EntityIdType:
    Copy + Clone + Eq + std::hash::Hash + std::fmt::Display + Send + Sync + 'static
{
    /// Generate a fresh timestamp-ordered id.
    fn now_v7() -> Self;

    /// Wrap an existing UUID.
    fn from_uuid(uuid: Uuid) -> Self;

    /// Access the underlying UUID.
    fn as_uuid(&self) -> Uuid;
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id! {
    /// Identifier for a user account.
    UserId
}
entity_id! {
    /// Identifier for a product project.
    ProjectId
}
entity_id! {
    /// Identifier for a conversation thread within a project.
    ConversationId
}
entity_id! {
    /// Identifier for a transcript message.
    MessageId
}
entity_id! {
    /// Identifier for an inter-agent communication record.
    CommunicationId
}
entity_id! {
    /// Identifier for a versioned artifact row.
    ArtifactId
}
entity_id! {
    /// Identifier for a token ledger entry.
    LedgerEntryId
}
entity_id! {
    /// Identifier for an escalation decision record.
    DecisionId
}

// =============================================================================
// TESTS
// =============================================================================
