//! Role profiles: built-in identity, default prompt, and artifact markers
//! for each agent on the panel.
//!
//! The engine never branches on a specific role; everything role-specific
//! lives here so a new role is a new profile, not new control flow.

use std::collections::HashMap;
use venture_core::{AgentRole, AgentRoleConfig, ArtifactType, NewArtifact, ProjectId};

/// Static description of one agent role.
#[derive(Debug, Clone)]
pub struct RoleProfile {
    pub role: AgentRole,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Built-in system prompt, used unless a config row overrides it.
    pub default_prompt: &'static str,
    /// Phrases whose presence in a reply flags extractable document content.
    pub artifact_markers: &'static [&'static str],
}

/// Indexed by the `profile` match below; one entry per role.
static PROFILES: [RoleProfile; 4] = [
    RoleProfile {
        role: AgentRole::Business,
        display_name: "Business Agent",
        description: "CPO/CRO of the panel: strategy, unit economics, MVP scoping, and coordination of the other agents.",
        default_prompt: BUSINESS_PROMPT,
        artifact_markers: &["**UNIT ECONOMICS**", "LTV/CAC", "**MVP SCOPE**"],
    },
    RoleProfile {
        role: AgentRole::Discovery,
        display_name: "Discovery Agent",
        description: "Market and customer discovery: target audience, market sizing, competitor landscape, go/no-go validation.",
        default_prompt: DISCOVERY_PROMPT,
        artifact_markers: &["**DISCOVERY SUMMARY**", "GO/NO-GO", "TAM:", "SAM:"],
    },
    RoleProfile {
        role: AgentRole::Delivery,
        display_name: "Delivery Agent",
        description: "Product delivery: PRDs, user stories, prioritization, and MVP scope.",
        default_prompt: DELIVERY_PROMPT,
        artifact_markers: &["**REQUIREMENTS SUMMARY**", "User Stories", "P0 (Must-have)"],
    },
    RoleProfile {
        role: AgentRole::TechLead,
        display_name: "Tech Lead Agent",
        description: "Technical direction: stack recommendations, architecture, feasibility, and build-vs-buy calls.",
        default_prompt: TECH_LEAD_PROMPT,
        artifact_markers: &["**TECHNICAL RECOMMENDATION**", "Recommended Stack", "Architecture"],
    },
];

/// Look up the built-in profile for a role.
pub fn profile(role: AgentRole) -> &'static RoleProfile {
    match role {
        AgentRole::Business => &PROFILES[0],
        AgentRole::Discovery => &PROFILES[1],
        AgentRole::Delivery => &PROFILES[2],
        AgentRole::TechLead => &PROFILES[3],
    }
}

/// All profiles in role declaration order.
pub fn all_profiles() -> Vec<&'static RoleProfile> {
    PROFILES.iter().collect()
}

/// Runtime view over the per-role prompt overrides.
#[derive(Debug, Clone, Default)]
pub struct RoleConfigSet {
    configs: HashMap<AgentRole, AgentRoleConfig>,
}

impl RoleConfigSet {
    pub fn new(configs: Vec<AgentRoleConfig>) -> Self {
        Self {
            configs: configs.into_iter().map(|c| (c.role, c)).collect(),
        }
    }

    /// The system prompt to use for a role: the custom override when one is
    /// configured and enabled, the built-in prompt otherwise.
    pub fn system_prompt(&self, role: AgentRole) -> &str {
        if let Some(config) = self.configs.get(&role) {
            if config.use_custom_prompt {
                if let Some(custom) = &config.custom_prompt {
                    return custom;
                }
            }
        }
        profile(role).default_prompt
    }
}

/// Extract a draft artifact from a reply, if the reply carries the role's
/// document markers. Used after artifact-request hops and after delegated
/// replies.
pub fn extract_artifact(
    reply: &str,
    role: AgentRole,
    project_id: ProjectId,
    project_name: &str,
) -> Option<NewArtifact> {
    let profile = profile(role);
    if !profile.artifact_markers.iter().any(|m| reply.contains(m)) {
        return None;
    }
    let artifact_type = role.owned_artifact();
    Some(NewArtifact::new(
        project_id,
        artifact_type,
        artifact_title(artifact_type, project_name),
        reply.to_string(),
        role,
    ))
}

/// Display title for an artifact family within a project.
pub fn artifact_title(artifact_type: ArtifactType, project_name: &str) -> String {
    format!("{}: {}", artifact_title_prefix(artifact_type), project_name)
}

fn artifact_title_prefix(artifact_type: ArtifactType) -> &'static str {
    match artifact_type {
        ArtifactType::MarketAnalysis => "Market Analysis",
        ArtifactType::Prd => "PRD",
        ArtifactType::UserStories => "User Stories",
        ArtifactType::TechSpec => "Tech Spec",
        ArtifactType::Architecture => "Architecture",
        ArtifactType::MvpScope => "MVP Scope",
        ArtifactType::UnitEconomics => "Unit Economics",
    }
}

// ============================================================================
// DEFAULT PROMPTS
// ============================================================================

const DIRECTIVE_GUIDE: &str = r#"
When you need another specialist, end your reply with a directive on its own line:
[[delegate:discovery]] [[delegate:delivery]] [[delegate:tech_lead]] [[delegate:business]]
When the founder should produce a document, use [[artifact:<type>]] with one of:
market_analysis, prd, user_stories, tech_spec, architecture, mvp_scope, unit_economics.
When only the founder can make the call, write [[escalate]] followed by the
options, one per line, as "- <label>: <description>"."#;

const BUSINESS_PROMPT: &str = concat!(
    r#"You are the Business Agent, the CPO/CRO of a product co-development panel.
You own strategy, unit economics (ARPU, CAC, LTV, LTV:CAC), pricing, and MVP
scoping, and you coordinate the discovery, delivery, and tech lead agents.
Be direct and quantitative. Always start with analysis, then ask targeted
questions. Respond in the founder's language."#,
    "\n",
    r#"
When you produce an MVP scope or unit-economics breakdown, head the section
with **MVP SCOPE** or **UNIT ECONOMICS** so it is captured as a document."#
);

const DISCOVERY_PROMPT: &str = concat!(
    r#"You are the Discovery Agent, the market-validation specialist of a product
co-development panel. You size markets (TAM/SAM/SOM), profile the target
audience, map competitors, and give explicit GO/NO-GO recommendations.
Ground every claim; separate facts from assumptions."#,
    "\n",
    r#"
When you deliver a full analysis, head it with **DISCOVERY SUMMARY** and
include TAM:, SAM:, and a GO/NO-GO call so it is captured as a document."#
);

const DELIVERY_PROMPT: &str = concat!(
    r#"You are the Delivery Agent, the product-delivery specialist of a product
co-development panel. You turn validated ideas into PRDs, user stories with
acceptance criteria, and a prioritized P0/P1/P2 MVP scope."#,
    "\n",
    r#"
When you deliver requirements, head them with **REQUIREMENTS SUMMARY** and
mark must-haves as "P0 (Must-have)" so they are captured as a document."#
);

const TECH_LEAD_PROMPT: &str = concat!(
    r#"You are the Tech Lead Agent, the technical specialist of a product
co-development panel. You recommend stacks, sketch architectures, flag
feasibility risks, and make build-vs-buy calls with cost estimates."#,
    "\n",
    r#"
When you deliver a recommendation, head it with **TECHNICAL RECOMMENDATION**
and include a "Recommended Stack" section so it is captured as a document."#
);

/// Directive instructions appended to every role's prompt.
pub fn directive_guide() -> &'static str {
    DIRECTIVE_GUIDE
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use venture_core::EntityIdType;

    #[test]
    fn test_every_role_has_a_profile() {
        for role in AgentRole::ALL {
            let p = profile(*role);
            assert_eq!(p.role, *role);
            assert!(!p.default_prompt.is_empty());
            assert!(!p.artifact_markers.is_empty());
        }
        assert_eq!(all_profiles().len(), AgentRole::ALL.len());
    }

    #[test]
    fn test_config_set_prefers_enabled_override() {
        let mut config = AgentRoleConfig::new(AgentRole::Discovery);
        config.custom_prompt = Some("You are terse.".to_string());
        config.use_custom_prompt = true;
        let set = RoleConfigSet::new(vec![config]);

        assert_eq!(set.system_prompt(AgentRole::Discovery), "You are terse.");
        // Other roles fall back to built-ins.
        assert_eq!(
            set.system_prompt(AgentRole::Business),
            profile(AgentRole::Business).default_prompt
        );
    }

    #[test]
    fn test_config_set_ignores_disabled_override() {
        let mut config = AgentRoleConfig::new(AgentRole::Discovery);
        config.custom_prompt = Some("You are terse.".to_string());
        config.use_custom_prompt = false;
        let set = RoleConfigSet::new(vec![config]);

        assert_eq!(
            set.system_prompt(AgentRole::Discovery),
            profile(AgentRole::Discovery).default_prompt
        );
    }

    #[test]
    fn test_extract_artifact_on_marker() {
        let project_id = ProjectId::now_v7();
        let reply = "Here is my take.\n\n**DISCOVERY SUMMARY**\nTAM: $4B\nGO";
        let artifact = extract_artifact(reply, AgentRole::Discovery, project_id, "SynthMart")
            .expect("marker present");
        assert_eq!(artifact.artifact_type, ArtifactType::MarketAnalysis);
        assert_eq!(artifact.title, "Market Analysis: SynthMart");
        assert_eq!(artifact.content, reply);
    }

    #[test]
    fn test_extract_artifact_absent_without_marker() {
        let reply = "Let me ask a few questions first.";
        assert!(extract_artifact(reply, AgentRole::TechLead, ProjectId::now_v7(), "X").is_none());
    }
}
