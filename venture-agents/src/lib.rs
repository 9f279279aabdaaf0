//! VENTURE Agents - Role registry and invocation runtime
//!
//! Everything role-specific lives in this crate: built-in role profiles and
//! prompts, the action classifier that reads directives out of replies,
//! keyword routing for explicit agent requests, and the runtime that turns a
//! role + context into a classified reply. The orchestration engine consumes
//! these pieces without knowing any role by name.

pub mod classifier;
pub mod roles;
pub mod router;
pub mod runtime;

pub use classifier::{ActionClassifier, AgentAction, MarkerClassifier};
pub use roles::{
    all_profiles, artifact_title, directive_guide, extract_artifact, profile, RoleConfigSet,
    RoleProfile,
};
pub use router::{detect_role_request, resolve_entry_agent};
pub use runtime::{AgentRuntime, InvokeOutcome, TurnContext, HISTORY_WINDOW};
