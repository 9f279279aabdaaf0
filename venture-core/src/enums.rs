//! Closed enums shared across the workspace.
//!
//! Every enum that is persisted carries `as_db_str`/`from_db_str` so the
//! storage layer and the wire format agree on one canonical snake_case
//! spelling, plus `Display`/`FromStr` delegating to the same strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an enum from its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub enum_name: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} value: {}", self.enum_name, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

macro_rules! db_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $db:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical storage string for this variant.
            pub fn as_db_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $db),+
                }
            }

            /// Parse from the canonical storage string.
            pub fn from_db_str(s: &str) -> Result<Self, ParseEnumError> {
                match s {
                    $($db => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        enum_name: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_db_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_db_str(s)
            }
        }
    };
}

db_enum! {
    /// The closed set of agent roles on the panel.
    ///
    /// The business agent coordinates; the others are specialists it can
    /// delegate to. New roles are added here and in the role-profile
    /// registry; the orchestrator's control flow never branches on a
    /// specific role.
    AgentRole {
        /// Coordinating agent: strategy, unit economics, final synthesis.
        Business => "business",
        /// Market and customer discovery specialist.
        Discovery => "discovery",
        /// Product delivery specialist: PRDs, user stories, MVP scoping.
        Delivery => "delivery",
        /// Technical specialist: specs, architecture, feasibility.
        TechLead => "tech_lead",
    }
}

db_enum! {
    /// Artifact families a project can accumulate.
    ArtifactType {
        MarketAnalysis => "market_analysis",
        Prd => "prd",
        UserStories => "user_stories",
        TechSpec => "tech_spec",
        Architecture => "architecture",
        MvpScope => "mvp_scope",
        UnitEconomics => "unit_economics",
    }
}

db_enum! {
    /// Review lifecycle of an artifact version. Forward-only, except that
    /// `Archived` is reachable from any state.
    ArtifactStatus {
        Draft => "draft",
        Review => "review",
        Approved => "approved",
        Archived => "archived",
    }
}

db_enum! {
    /// Kinds of inter-agent communication records.
    CommunicationKind {
        Delegation => "delegation",
        Request => "request",
        Response => "response",
        StatusUpdate => "status_update",
        ArtifactCreated => "artifact_created",
        ReviewRequest => "review_request",
        Approval => "approval",
    }
}

db_enum! {
    /// Author of a transcript message.
    MessageRole {
        User => "user",
        Assistant => "assistant",
    }
}

db_enum! {
    /// Account role. Admins get the management surface.
    UserRole {
        User => "user",
        Admin => "admin",
    }
}

db_enum! {
    /// Free-form project progression; the engine never branches on it.
    ProjectStatus {
        Discovery => "discovery",
        Delivery => "delivery",
        Development => "development",
        Launch => "launch",
    }
}

db_enum! {
    /// Lifecycle of an escalation decision.
    DecisionStatus {
        Pending => "pending",
        Decided => "decided",
        Skipped => "skipped",
    }
}

db_enum! {
    /// Entity kinds, used in error reporting.
    EntityType {
        User => "user",
        Project => "project",
        Conversation => "conversation",
        Message => "message",
        Communication => "communication",
        Artifact => "artifact",
        LedgerEntry => "ledger_entry",
        Decision => "decision",
        RoleConfig => "role_config",
    }
}

impl ArtifactStatus {
    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Draft -> Review -> Approved is forward-only; Archived is a sink
    /// reachable from anywhere.
    pub fn can_transition_to(&self, next: ArtifactStatus) -> bool {
        use ArtifactStatus::*;
        matches!(
            (self, next),
            (Draft, Review) | (Draft, Approved) | (Review, Approved) | (_, Archived)
        )
    }
}

impl AgentRole {
    /// The artifact family this role authors when asked for a document.
    pub fn owned_artifact(&self) -> ArtifactType {
        match self {
            AgentRole::Business => ArtifactType::MvpScope,
            AgentRole::Discovery => ArtifactType::MarketAnalysis,
            AgentRole::Delivery => ArtifactType::Prd,
            AgentRole::TechLead => ArtifactType::TechSpec,
        }
    }

    /// The role responsible for producing a given artifact family.
    pub fn owner_of(artifact_type: ArtifactType) -> AgentRole {
        match artifact_type {
            ArtifactType::MarketAnalysis => AgentRole::Discovery,
            ArtifactType::Prd | ArtifactType::UserStories => AgentRole::Delivery,
            ArtifactType::TechSpec | ArtifactType::Architecture => AgentRole::TechLead,
            ArtifactType::MvpScope | ArtifactType::UnitEconomics => AgentRole::Business,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_role_db_str_roundtrip() {
        for role in AgentRole::ALL {
            let s = role.as_db_str();
            assert_eq!(AgentRole::from_db_str(s).unwrap(), *role);
        }
    }

    #[test]
    fn test_agent_role_from_db_str_rejects_unknown() {
        let err = AgentRole::from_db_str("project_manager").unwrap_err();
        assert_eq!(err.enum_name, "AgentRole");
        assert!(err.to_string().contains("project_manager"));
    }

    #[test]
    fn test_artifact_type_serde_matches_db_str() {
        for ty in ArtifactType::ALL {
            let json = serde_json::to_string(ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_db_str()));
        }
    }

    #[test]
    fn test_communication_kind_roundtrip() {
        for kind in CommunicationKind::ALL {
            assert_eq!(
                CommunicationKind::from_db_str(kind.as_db_str()).unwrap(),
                *kind
            );
        }
    }

    #[test]
    fn test_artifact_status_forward_transitions() {
        use ArtifactStatus::*;
        assert!(Draft.can_transition_to(Review));
        assert!(Draft.can_transition_to(Approved));
        assert!(Review.can_transition_to(Approved));
        assert!(Draft.can_transition_to(Archived));
        assert!(Approved.can_transition_to(Archived));
    }

    #[test]
    fn test_artifact_status_rejects_backward_transitions() {
        use ArtifactStatus::*;
        assert!(!Review.can_transition_to(Draft));
        assert!(!Approved.can_transition_to(Review));
        assert!(!Approved.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Approved));
    }

    #[test]
    fn test_role_artifact_ownership_is_consistent() {
        for role in AgentRole::ALL {
            assert_eq!(AgentRole::owner_of(role.owned_artifact()), *role);
        }
    }

    #[test]
    fn test_display_uses_db_str() {
        assert_eq!(AgentRole::TechLead.to_string(), "tech_lead");
        assert_eq!(ArtifactType::MarketAnalysis.to_string(), "market_analysis");
        let parsed: AgentRole = "tech_lead".parse().unwrap();
        assert_eq!(parsed, AgentRole::TechLead);
    }
}
