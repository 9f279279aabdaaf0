//! VENTURE Engine - Turn orchestration
//!
//! The engine runs one user message through the agent panel: entry-agent
//! selection, bounded delegation between roles, artifact generation, and
//! escalation back to the user, with every provider call admitted against
//! the user's token budget before it runs and charged after it returns.
//! Storage and the completion provider arrive as trait objects; the engine
//! holds no role-specific or transport-specific logic.

pub mod orchestrator;
pub mod turn;

pub use orchestrator::Orchestrator;
pub use turn::{TurnOutcome, TurnRequest, TurnState, UserTokens};
