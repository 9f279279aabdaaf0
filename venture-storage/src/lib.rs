//! VENTURE Storage - Contracts and in-memory reference implementation
//!
//! The engine and the API depend only on the traits in [`traits`];
//! [`MemoryStorage`] is the reference implementation carrying the full
//! contract semantics (atomic ledger admission, per-conversation sequence
//! numbers, per-family artifact versions). A database-backed implementation
//! slots in behind the same traits.

pub mod memory;
pub mod traits;

pub use memory::MemoryStorage;
pub use traits::{
    ArtifactStore, ChargeScope, CommunicationLog, ConversationStore, DecisionStore, ProjectStore,
    Reservation, RoleConfigStore, Storage, TokenLedger, UserStore,
};
