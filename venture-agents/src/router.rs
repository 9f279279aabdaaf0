//! Explicit agent routing from user phrasing.
//!
//! A user message that names a specialist by keyword overrides the
//! conversation's sticky agent for that turn. Unrelated text routes
//! nowhere and the sticky agent (or the default) handles it.

use venture_core::AgentRole;

/// Keyword sets per role, checked in declaration order; the first role with
/// a matching keyword wins. Matching is case-insensitive substring.
const ROLE_KEYWORDS: &[(AgentRole, &[&str])] = &[
    (
        AgentRole::Business,
        &["business agent", "cpo", "cro", "unit economics", "pricing model"],
    ),
    (
        AgentRole::Discovery,
        &[
            "discovery",
            "market research",
            "validate",
            "competitors",
            "market size",
        ],
    ),
    (
        AgentRole::Delivery,
        &["delivery", "requirements", "user stories", "user story", "prd"],
    ),
    (
        AgentRole::TechLead,
        &["tech lead", "architecture", "technical", "stack"],
    ),
];

/// Detect an explicit role request in a user message.
pub fn detect_role_request(message: &str) -> Option<AgentRole> {
    let lower = message.to_lowercase();
    for (role, keywords) in ROLE_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return Some(*role);
        }
    }
    None
}

/// Resolve the entry agent for a turn: explicit request, else the sticky
/// agent from the last committed turn, else the coordinating business agent.
pub fn resolve_entry_agent(message: &str, sticky: Option<AgentRole>) -> AgentRole {
    detect_role_request(message)
        .or(sticky)
        .unwrap_or(AgentRole::Business)
}

// =============================================================================
// TESTS
// =============================================================================
