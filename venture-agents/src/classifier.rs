//! Action classification: turning a raw agent reply into the next
//! orchestration step.
//!
//! The classifier is a trait seam so the decision mechanism can be swapped
//! (structured tool output, a grammar, a second model) without touching the
//! engine. The shipped `MarkerClassifier` parses inline `[[...]]` directives
//! from the reply text, so the decision stays inside the model's own output
//! and the engine never guesses.

use venture_core::{AgentRole, ArtifactType, DecisionOption};

/// The next step an agent's reply asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// A direct answer; the turn can commit.
    Reply,
    /// Hand the question to another role.
    Delegate {
        to: AgentRole,
        instructions: String,
    },
    /// Ask a role to produce a versioned document.
    RequestArtifact {
        artifact_type: ArtifactType,
        instructions: String,
    },
    /// Surface a decision to the user.
    ///
    /// `ambiguous` marks classifications synthesized from a directive the
    /// classifier could not parse; the options list is empty in that case
    /// and the engine fills in a visible placeholder.
    Escalate {
        options: Vec<DecisionOption>,
        ambiguous: bool,
    },
}

/// Classify a reply into the action it requests.
pub trait ActionClassifier: Send + Sync {
    fn classify(&self, role: AgentRole, reply: &str) -> AgentAction;
}

/// Directive opener scanned for in reply text.
const DIRECTIVE_OPEN: &str = "[[";
const DIRECTIVE_CLOSE: &str = "]]";

/// Plain-text escalation phrases kept for replies that ask for a decision
/// without emitting the directive.
const ESCALATION_PHRASES: &[&str] = &["DECISION NEEDED", "Your decision?"];

/// Default classifier: scans for the first `[[...]]` directive.
///
/// Recognized forms:
/// - `[[delegate:<role>]]` with the remainder of the line as instructions
/// - `[[artifact:<type>]]` with the remainder of the line as instructions
/// - `[[escalate]]` followed by option lines `- <label>: <description>`
///
/// A directive that does not parse (unknown verb, unknown role or artifact
/// type) classifies as an ambiguous escalation rather than being dropped.
#[derive(Debug, Clone, Default)]
pub struct MarkerClassifier;

impl MarkerClassifier {
    pub fn new() -> Self {
        Self
    }

    fn parse_directive(&self, reply: &str, open_at: usize) -> AgentAction {
        let after_open = &reply[open_at + DIRECTIVE_OPEN.len()..];
        let Some(close_rel) = after_open.find(DIRECTIVE_CLOSE) else {
            return ambiguous_escalation();
        };
        let directive = after_open[..close_rel].trim();
        let rest = &after_open[close_rel + DIRECTIVE_CLOSE.len()..];

        match directive.split_once(':') {
            Some(("delegate", role)) => match role.trim().parse::<AgentRole>() {
                Ok(to) => AgentAction::Delegate {
                    to,
                    instructions: first_line(rest),
                },
                Err(_) => ambiguous_escalation(),
            },
            Some(("artifact", ty)) => match ty.trim().parse::<ArtifactType>() {
                Ok(artifact_type) => AgentAction::RequestArtifact {
                    artifact_type,
                    instructions: first_line(rest),
                },
                Err(_) => ambiguous_escalation(),
            },
            None if directive == "escalate" => AgentAction::Escalate {
                options: parse_options(rest),
                ambiguous: false,
            },
            _ => ambiguous_escalation(),
        }
    }
}

impl ActionClassifier for MarkerClassifier {
    fn classify(&self, role: AgentRole, reply: &str) -> AgentAction {
        if let Some(open_at) = reply.find(DIRECTIVE_OPEN) {
            let action = self.parse_directive(reply, open_at);
            tracing::debug!(%role, ?action, "classified directive");
            return action;
        }
        if ESCALATION_PHRASES.iter().any(|p| reply.contains(p)) {
            return AgentAction::Escalate {
                options: parse_options(reply),
                ambiguous: false,
            };
        }
        AgentAction::Reply
    }
}

fn ambiguous_escalation() -> AgentAction {
    AgentAction::Escalate {
        options: Vec::new(),
        ambiguous: true,
    }
}

fn first_line(rest: &str) -> String {
    rest.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Parse escalation options from lines of the form `- label: description`.
fn parse_options(text: &str) -> Vec<DecisionOption> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim().strip_prefix("- ")?;
            match line.split_once(':') {
                Some((label, description)) => Some(DecisionOption::new(
                    label.trim(),
                    description.trim(),
                )),
                None => Some(DecisionOption::new(line.trim(), "")),
            }
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(reply: &str) -> AgentAction {
        MarkerClassifier::new().classify(AgentRole::Business, reply)
    }

    #[test]
    fn test_plain_reply() {
        assert_eq!(classify("The pricing looks sound. Ship it."), AgentAction::Reply);
    }

    #[test]
    fn test_delegate_directive() {
        let action = classify(
            "We need market numbers first.\n[[delegate:discovery]] Size the TAM for synth marketplaces.",
        );
        assert_eq!(
            action,
            AgentAction::Delegate {
                to: AgentRole::Discovery,
                instructions: "Size the TAM for synth marketplaces.".to_string(),
            }
        );
    }

    #[test]
    fn test_artifact_directive() {
        let action = classify("[[artifact:tech_spec]] Document the recommended stack.");
        assert_eq!(
            action,
            AgentAction::RequestArtifact {
                artifact_type: ArtifactType::TechSpec,
                instructions: "Document the recommended stack.".to_string(),
            }
        );
    }

    #[test]
    fn test_escalate_directive_with_options() {
        let action = classify(
            "Only you can pick the pricing model.\n[[escalate]]\n- subscription: Monthly recurring revenue\n- usage: Pay per listing",
        );
        match action {
            AgentAction::Escalate { options, ambiguous } => {
                assert!(!ambiguous);
                assert_eq!(options.len(), 2);
                assert_eq!(options[0].label, "subscription");
                assert_eq!(options[1].description, "Pay per listing");
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_role_is_ambiguous_escalation() {
        let action = classify("[[delegate:project_manager]] please");
        assert_eq!(
            action,
            AgentAction::Escalate {
                options: vec![],
                ambiguous: true,
            }
        );
    }

    #[test]
    fn test_unknown_verb_is_ambiguous_escalation() {
        assert_eq!(
            classify("[[summon:discovery]]"),
            AgentAction::Escalate {
                options: vec![],
                ambiguous: true,
            }
        );
    }

    #[test]
    fn test_unclosed_directive_is_ambiguous_escalation() {
        assert_eq!(
            classify("[[delegate:discovery"),
            AgentAction::Escalate {
                options: vec![],
                ambiguous: true,
            }
        );
    }

    #[test]
    fn test_escalation_phrase_without_directive() {
        let action = classify("DECISION NEEDED\n- go: Launch now\n- wait: Gather more data");
        match action {
            AgentAction::Escalate { options, ambiguous } => {
                assert!(!ambiguous);
                assert_eq!(options.len(), 2);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_option_line_without_description() {
        let options = parse_options("- go\n- no-go: stay in discovery");
        assert_eq!(options[0].label, "go");
        assert_eq!(options[0].description, "");
        assert_eq!(options[1].label, "no-go");
    }
}
