//! The turn orchestrator.
//!
//! One `run_turn` drives the state machine:
//! `SelectAgent -> AwaitingAgent -> {ReplyReady | Delegating |
//! ArtifactPending | Escalated} -> committed / failed`.
//!
//! Per hop: reserve tokens, invoke the role (with retries for transient
//! provider failures), commit the actual usage, append the reply to the
//! transcript, and classify the next step. Reaching the delegation bound
//! escalates to the user; it never fails the turn. A failed turn keeps all
//! previously committed rows.

use crate::turn::{TurnOutcome, TurnRequest, TurnState, UserTokens};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use venture_agents::{
    artifact_title, extract_artifact, profile, resolve_entry_agent, AgentAction, AgentRuntime,
    RoleConfigSet, TurnContext,
};
use venture_core::{
    truncate_summary, AgentCommunication, AgentRole, Artifact, ArtifactType, AuthorizationError,
    CommunicationKind, Conversation, ConversationId, Decision, DecisionOption, EntityIdType,
    Message, MessageRole, NewArtifact, NewCommunication, OrchestratorConfig, OrchestratorError,
    Project, StorageError, VentureError, VentureResult,
};
use venture_llm::{ChatMessage, CompletionProvider, TokenUsage};
use venture_storage::{ChargeScope, Storage};

/// Orchestrates turns against storage and a completion provider.
pub struct Orchestrator {
    storage: Arc<dyn Storage>,
    runtime: AgentRuntime,
    config: OrchestratorConfig,
    /// One writer per conversation; turns in the same thread serialize,
    /// turns in different threads proceed concurrently.
    turn_locks: DashMap<ConversationId, Arc<tokio::sync::Mutex<()>>>,
}

impl Orchestrator {
    pub fn new(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn CompletionProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        let runtime =
            AgentRuntime::new(provider, Duration::from_millis(config.invoke_timeout_ms));
        Self {
            storage,
            runtime,
            config,
            turn_locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one turn to completion.
    ///
    /// # Returns
    /// * `Ok(TurnOutcome)` - the turn committed (possibly escalated)
    /// * `Err(_)` - the turn failed; rows committed by earlier hops stay
    pub async fn run_turn(&self, req: TurnRequest) -> VentureResult<TurnOutcome> {
        let user = self.storage.get_user(req.user_id).await?;
        if !user.is_active {
            return Err(AuthorizationError::AccountDeactivated {
                user_id: req.user_id.as_uuid(),
            }
            .into());
        }
        let project = self.storage.get_project(req.project_id).await?;
        if project.owner_id != req.user_id {
            return Err(AuthorizationError::Forbidden {
                user_id: req.user_id.as_uuid(),
                action: format!("access project {}", req.project_id),
            }
            .into());
        }
        if let Some(conversation_id) = req.conversation_id {
            let conversation = self.storage.get_conversation(conversation_id).await?;
            if conversation.project_id != req.project_id {
                return Err(OrchestratorError::ConversationProjectMismatch {
                    conversation_id: conversation_id.as_uuid(),
                    project_id: req.project_id.as_uuid(),
                }
                .into());
            }
        }

        // Admission for the first hop happens before anything persists, so
        // a quota rejection leaves no trace of the turn.
        let first_hold = self
            .storage
            .reserve(req.user_id, self.config.reserve_estimate)
            .await?;

        let conversation = match self
            .storage
            .get_or_create_conversation(req.project_id, req.conversation_id, &req.content)
            .await
        {
            Ok(conversation) => conversation,
            Err(e) => {
                let _ = self.storage.release(first_hold).await;
                return Err(e);
            }
        };

        let lock = self
            .turn_locks
            .entry(conversation.conversation_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let turn_guard = lock.lock().await;

        let result = match self.drive(&req, &project, &conversation, first_hold).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation.conversation_id,
                    error = %e,
                    "turn failed"
                );
                Err(e)
            }
        };
        drop(turn_guard);
        // Two strong references means the map's entry plus our clone: no
        // other turn holds or is waiting on this lock. The check runs under
        // the shard lock, where clones also happen, so it cannot race.
        self.turn_locks
            .remove_if(&conversation.conversation_id, |_, l| {
                Arc::strong_count(l) <= 2
            });
        result
    }

    /// The state machine body. `first_hold` is the already-admitted
    /// reservation for the entry hop.
    async fn drive(
        &self,
        req: &TurnRequest,
        project: &Project,
        conversation: &Conversation,
        first_hold: venture_storage::Reservation,
    ) -> VentureResult<TurnOutcome> {
        let conversation_id = conversation.conversation_id;

        // Transcript snapshot before this turn's user message.
        let history: Vec<ChatMessage> = self
            .storage
            .history(conversation_id)
            .await?
            .into_iter()
            .map(|m| match m.role {
                MessageRole::User => ChatMessage::user(m.content),
                MessageRole::Assistant => ChatMessage::assistant(m.content),
            })
            .collect();

        let configs = RoleConfigSet::new(self.storage.list_role_configs().await?);

        if let Err(e) = self
            .storage
            .append_message(Message::user(
                conversation_id,
                req.project_id,
                req.content.clone(),
            ))
            .await
        {
            let _ = self.storage.release(first_hold).await;
            return Err(e);
        }

        let mut hold = Some(first_hold);
        let mut state = TurnState::SelectAgent;
        let mut lead: Option<AgentRole> = None;
        let mut replies: Vec<(AgentRole, String)> = Vec::new();
        let mut delegations_used: u32 = 0;
        let mut pending_artifact: Option<(AgentRole, ArtifactType)> = None;
        let mut turn_usage = TokenUsage::default();
        let mut communications: Vec<AgentCommunication> = Vec::new();
        let mut artifacts: Vec<Artifact> = Vec::new();
        let mut needs_decision = false;
        let mut decision_options: Vec<DecisionOption> = Vec::new();

        loop {
            tracing::debug!(
                conversation_id = %conversation_id,
                state = state.name(),
                delegations_used,
                "turn state"
            );
            state = match state {
                TurnState::SelectAgent => {
                    let role = resolve_entry_agent(&req.content, conversation.current_agent);
                    lead = Some(role);
                    TurnState::AwaitingAgent {
                        role,
                        prompt: req.content.clone(),
                    }
                }

                TurnState::AwaitingAgent { role, prompt } => {
                    let reservation = match hold.take() {
                        Some(reservation) => reservation,
                        // Mid-turn admission; exhaustion here fails the turn
                        // and committed hops stay.
                        None => {
                            self.storage
                                .reserve(req.user_id, self.config.reserve_estimate)
                                .await?
                        }
                    };

                    let ctx = TurnContext {
                        project_name: project.name.clone(),
                        project_description: project.description.clone(),
                        project_context: project.context.clone(),
                        history: history.clone(),
                        prompt,
                    };
                    let outcome = match self.invoke_with_retry(role, &ctx, &configs).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            let _ = self.storage.release(reservation).await;
                            return Err(e);
                        }
                    };
                    self.storage
                        .commit(
                            reservation,
                            outcome.usage.input_tokens,
                            outcome.usage.output_tokens,
                            ChargeScope {
                                project_id: req.project_id,
                                conversation_id,
                                agent: role,
                            },
                        )
                        .await?;
                    turn_usage.add(outcome.usage);

                    self.storage
                        .append_message(Message::assistant(
                            conversation_id,
                            req.project_id,
                            role,
                            outcome.reply.clone(),
                        ))
                        .await?;
                    replies.push((role, outcome.reply.clone()));

                    // An artifact hop produces its document from the owning
                    // role's reply and terminates the turn.
                    if let Some((requested_by, artifact_type)) = pending_artifact.take() {
                        let artifact = self
                            .create_artifact_with_retry(NewArtifact::new(
                                req.project_id,
                                artifact_type,
                                artifact_title(artifact_type, &project.name),
                                outcome.reply.clone(),
                                role,
                            ))
                            .await?;
                        let comm = self
                            .storage
                            .append_communication(
                                NewCommunication::new(
                                    conversation_id,
                                    req.project_id,
                                    role,
                                    requested_by,
                                    CommunicationKind::ArtifactCreated,
                                    format!("Created artifact: {}", artifact.title),
                                )
                                .with_artifact(artifact.artifact_id),
                            )
                            .await?;
                        artifacts.push(artifact);
                        communications.push(comm);
                        TurnState::ReplyReady
                    } else {
                        match outcome.action {
                            AgentAction::Reply => {
                                if let Some(lead_role) = lead.filter(|l| *l != role) {
                                    let comm = self
                                        .storage
                                        .append_communication(NewCommunication::new(
                                            conversation_id,
                                            req.project_id,
                                            role,
                                            lead_role,
                                            CommunicationKind::Response,
                                            truncate_summary(&outcome.reply),
                                        ))
                                        .await?;
                                    communications.push(comm);
                                }
                                // Marker-flagged document content in the
                                // reply becomes a draft artifact.
                                if let Some(draft) = extract_artifact(
                                    &outcome.reply,
                                    role,
                                    req.project_id,
                                    &project.name,
                                ) {
                                    let artifact =
                                        self.create_artifact_with_retry(draft).await?;
                                    if let Some(lead_role) = lead.filter(|l| *l != role) {
                                        let comm = self
                                            .storage
                                            .append_communication(
                                                NewCommunication::new(
                                                    conversation_id,
                                                    req.project_id,
                                                    role,
                                                    lead_role,
                                                    CommunicationKind::ArtifactCreated,
                                                    format!(
                                                        "Created artifact: {}",
                                                        artifact.title
                                                    ),
                                                )
                                                .with_artifact(artifact.artifact_id),
                                            )
                                            .await?;
                                        communications.push(comm);
                                    }
                                    artifacts.push(artifact);
                                }
                                TurnState::ReplyReady
                            }
                            AgentAction::Delegate { to, instructions } => TurnState::Delegating {
                                from: role,
                                to,
                                instructions,
                            },
                            AgentAction::RequestArtifact {
                                artifact_type,
                                instructions,
                            } => TurnState::ArtifactPending {
                                requested_by: role,
                                artifact_type,
                                instructions,
                            },
                            AgentAction::Escalate { options, ambiguous } => TurnState::Escalated {
                                by: role,
                                options,
                                ambiguous,
                            },
                        }
                    }
                }

                TurnState::Delegating {
                    from,
                    to,
                    instructions,
                } => {
                    if delegations_used >= self.config.max_delegation_hops {
                        tracing::info!(
                            conversation_id = %conversation_id,
                            %from,
                            %to,
                            bound = self.config.max_delegation_hops,
                            "delegation bound reached, escalating"
                        );
                        TurnState::Escalated {
                            by: from,
                            options: hop_bound_options(to),
                            ambiguous: false,
                        }
                    } else {
                        delegations_used += 1;
                        let content = if instructions.trim().is_empty() {
                            format!("Handing off to {}", profile(to).display_name)
                        } else {
                            instructions.clone()
                        };
                        let comm = self
                            .storage
                            .append_communication(NewCommunication::new(
                                conversation_id,
                                req.project_id,
                                from,
                                to,
                                CommunicationKind::Delegation,
                                content.clone(),
                            ))
                            .await?;
                        communications.push(comm);
                        TurnState::AwaitingAgent {
                            role: to,
                            prompt: content,
                        }
                    }
                }

                TurnState::ArtifactPending {
                    requested_by,
                    artifact_type,
                    instructions,
                } => {
                    let counts = self.config.artifact_hops_share_budget;
                    if counts && delegations_used >= self.config.max_delegation_hops {
                        TurnState::Escalated {
                            by: requested_by,
                            options: hop_bound_options(AgentRole::owner_of(artifact_type)),
                            ambiguous: false,
                        }
                    } else {
                        if counts {
                            delegations_used += 1;
                        }
                        let owner = AgentRole::owner_of(artifact_type);
                        let content = if instructions.trim().is_empty() {
                            format!("Produce the {} document", artifact_type)
                        } else {
                            instructions.clone()
                        };
                        let comm = self
                            .storage
                            .append_communication(NewCommunication::new(
                                conversation_id,
                                req.project_id,
                                requested_by,
                                owner,
                                CommunicationKind::Request,
                                content.clone(),
                            ))
                            .await?;
                        communications.push(comm);
                        pending_artifact = Some((requested_by, artifact_type));
                        TurnState::AwaitingAgent {
                            role: owner,
                            prompt: content,
                        }
                    }
                }

                TurnState::Escalated {
                    by,
                    options,
                    ambiguous,
                } => {
                    let options = if options.is_empty() {
                        if ambiguous {
                            ambiguous_options(by)
                        } else {
                            hop_bound_options(by)
                        }
                    } else {
                        options
                    };
                    let question = replies
                        .iter()
                        .rev()
                        .find(|(role, _)| *role == by)
                        .map(|(_, reply)| truncate_summary(reply))
                        .unwrap_or_else(|| truncate_summary(&req.content));
                    self.storage
                        .insert_decision(Decision::new(
                            req.project_id,
                            conversation_id,
                            by,
                            question,
                            options.clone(),
                        ))
                        .await?;
                    needs_decision = true;
                    decision_options = options;
                    break;
                }

                TurnState::ReplyReady => break,
            };
        }

        // The turn commits: the lead becomes the sticky agent.
        let lead_role = lead.unwrap_or(AgentRole::Business);
        self.storage
            .set_current_agent(conversation_id, lead_role)
            .await?;

        let (used, limit) = self.storage.usage(req.user_id).await?;
        Ok(TurnOutcome {
            message: combine_replies(&replies),
            conversation_id,
            agent: lead_role,
            needs_decision,
            decision_options,
            communications,
            artifacts,
            usage: turn_usage,
            user_tokens: UserTokens { used, limit },
        })
    }

    /// Invoke a role, retrying transient provider failures with capped
    /// exponential backoff.
    async fn invoke_with_retry(
        &self,
        role: AgentRole,
        ctx: &TurnContext,
        configs: &RoleConfigSet,
    ) -> VentureResult<venture_agents::InvokeOutcome> {
        let mut attempt: u32 = 1;
        loop {
            match self.runtime.invoke(role, ctx, configs).await {
                Ok(outcome) => return Ok(outcome),
                Err(VentureError::Provider(e)) if e.is_transient() => {
                    if attempt >= self.config.max_invoke_attempts {
                        return Err(OrchestratorError::InvocationExhausted {
                            role,
                            attempts: attempt,
                            reason: e.to_string(),
                        }
                        .into());
                    }
                    let delay = self.config.backoff_ms(attempt);
                    tracing::warn!(
                        %role,
                        attempt,
                        delay_ms = delay,
                        error = %e,
                        "transient provider failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Create an artifact version, retrying exactly once on a version
    /// conflict with a freshly computed version.
    async fn create_artifact_with_retry(&self, draft: NewArtifact) -> VentureResult<Artifact> {
        match self.storage.create_artifact_version(draft.clone()).await {
            Err(VentureError::Storage(StorageError::VersionConflict { family, .. })) => {
                tracing::warn!(%family, "artifact version conflict, retrying once");
                self.storage
                    .create_artifact_version(draft)
                    .await
                    .map_err(|e| match e {
                        VentureError::Storage(StorageError::VersionConflict {
                            family, ..
                        }) => OrchestratorError::VersionConflictPersisted { family }.into(),
                        other => other,
                    })
            }
            other => other,
        }
    }
}

/// Presentation form of the turn's replies: the lead reply followed by each
/// specialist reply under its display name.
fn combine_replies(replies: &[(AgentRole, String)]) -> String {
    let mut parts = replies.iter();
    let Some((_, first)) = parts.next() else {
        return String::new();
    };
    let mut combined = first.clone();
    for (role, reply) in parts {
        combined.push_str(&format!(
            "\n\n---\n\n**{}:**\n\n{}",
            profile(*role).display_name,
            reply
        ));
    }
    combined
}

fn hop_bound_options(next: AgentRole) -> Vec<DecisionOption> {
    vec![
        DecisionOption::new(
            "continue",
            format!(
                "Start a new turn with the {} to take this further",
                profile(next).display_name
            ),
        ),
        DecisionOption::new("answer", "Take the replies so far as the answer"),
    ]
}

fn ambiguous_options(by: AgentRole) -> Vec<DecisionOption> {
    vec![
        DecisionOption::new(
            "clarify",
            format!(
                "Ask the {} to restate what it needs",
                profile(by).display_name
            ),
        ),
        DecisionOption::new("answer", "Take the reply as-is"),
    ]
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use venture_core::{
        ArtifactStatus, CommunicationKind, DecisionStatus, LedgerError, Project, User, UserId,
    };
    use venture_llm::{ScriptStep, ScriptedProvider};
    use venture_storage::{
        CommunicationLog, ConversationStore, DecisionStore, MemoryStorage, ProjectStore,
        TokenLedger, UserStore,
    };

    struct Fixture {
        storage: Arc<MemoryStorage>,
        orchestrator: Orchestrator,
        user_id: UserId,
        project_id: venture_core::ProjectId,
    }

    /// Tight backoff and a small reserve so tests run fast.
    fn quick_config() -> OrchestratorConfig {
        OrchestratorConfig {
            backoff_base_ms: 1,
            backoff_cap_ms: 2,
            reserve_estimate: 1_000,
            ..Default::default()
        }
    }

    async fn fixture(script: Vec<ScriptStep>, config: OrchestratorConfig) -> Fixture {
        fixture_with_user(
            User::new("founder@example.com", "Founder"),
            script,
            config,
        )
        .await
    }

    async fn fixture_with_user(
        user: User,
        script: Vec<ScriptStep>,
        config: OrchestratorConfig,
    ) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let user = storage.insert_user(user).await.unwrap();
        let project = storage
            .insert_project(Project::new(user.user_id, "SynthMart"))
            .await
            .unwrap();
        let orchestrator = Orchestrator::new(
            storage.clone(),
            Arc::new(ScriptedProvider::new(script)),
            config,
        );
        Fixture {
            storage,
            orchestrator,
            user_id: user.user_id,
            project_id: project.project_id,
        }
    }

    fn request(fx: &Fixture, content: &str) -> TurnRequest {
        TurnRequest {
            user_id: fx.user_id,
            project_id: fx.project_id,
            conversation_id: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_delegation_turn_charges_each_hop() {
        let fx = fixture(
            vec![
                ScriptStep::reply(
                    "Need a feasibility read first.\n[[delegate:tech_lead]] Assess feasibility.",
                    300,
                    120,
                ),
                ScriptStep::reply("A lean web app is feasible in six weeks.", 500, 200),
            ],
            quick_config(),
        )
        .await;

        let outcome = fx
            .orchestrator
            .run_turn(request(&fx, "I want to build a synth marketplace"))
            .await
            .unwrap();

        assert_eq!(outcome.usage.total(), 1_120);
        assert_eq!(outcome.user_tokens.used, 1_120);
        assert_eq!(outcome.user_tokens.limit, venture_core::DEFAULT_TOKEN_LIMIT);
        assert_eq!(outcome.agent, AgentRole::Business);
        assert!(!outcome.needs_decision);

        let entries = fx.storage.ledger_entries(fx.user_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].agent, AgentRole::Business);
        assert_eq!(entries[0].charged, 420);
        assert_eq!(entries[1].agent, AgentRole::TechLead);
        assert_eq!(entries[1].charged, 700);

        // User message plus one assistant message per hop.
        let transcript = fx
            .storage
            .history(outcome.conversation_id)
            .await
            .unwrap();
        assert_eq!(transcript.len(), 3);

        // Delegated reply is presented under the specialist's name.
        assert!(outcome.message.starts_with("Need a feasibility read first."));
        assert!(outcome.message.contains("**Tech Lead Agent:**"));
        assert!(outcome.message.contains("lean web app"));

        let conversation = fx
            .storage
            .get_conversation(outcome.conversation_id)
            .await
            .unwrap();
        assert_eq!(conversation.current_agent, Some(AgentRole::Business));
    }

    #[tokio::test]
    async fn test_quota_rejection_leaves_storage_untouched() {
        let mut user = User::new("founder@example.com", "Founder");
        user.tokens_used = 24_900;
        let fx = fixture_with_user(
            user,
            vec![ScriptStep::reply("never reached", 10, 10)],
            OrchestratorConfig {
                reserve_estimate: 300,
                ..quick_config()
            },
        )
        .await;

        let err = fx
            .orchestrator
            .run_turn(request(&fx, "One more question"))
            .await
            .unwrap_err();
        match err {
            VentureError::Ledger(LedgerError::QuotaExceeded {
                used,
                limit,
                requested,
                ..
            }) => {
                assert_eq!(used, 24_900);
                assert_eq!(limit, venture_core::DEFAULT_TOKEN_LIMIT);
                assert_eq!(requested, 300);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // The rejected turn left no rows behind.
        assert!(fx
            .storage
            .list_conversations(fx.project_id)
            .await
            .unwrap()
            .is_empty());
        assert!(fx
            .storage
            .list_project_communications(fx.project_id, None)
            .await
            .unwrap()
            .is_empty());
        assert!(fx.storage.ledger_entries(fx.user_id).await.unwrap().is_empty());
        let (used, _) = fx.storage.usage(fx.user_id).await.unwrap();
        assert_eq!(used, 24_900);
    }

    #[tokio::test]
    async fn test_delegated_artifact_orders_communications() {
        let fx = fixture(
            vec![
                ScriptStep::reply(
                    "Let me get this validated.\n[[delegate:discovery]] Validate the market.",
                    100,
                    50,
                ),
                ScriptStep::reply(
                    "**DISCOVERY SUMMARY**\nTAM: $4B\nSAM: $400M\nGO",
                    200,
                    80,
                ),
            ],
            quick_config(),
        )
        .await;

        let outcome = fx
            .orchestrator
            .run_turn(request(&fx, "Is this idea worth pursuing?"))
            .await
            .unwrap();

        let comms = fx
            .storage
            .list_communications(outcome.conversation_id, None)
            .await
            .unwrap();
        assert_eq!(comms.len(), 3);
        assert_eq!(comms[0].kind, CommunicationKind::Delegation);
        assert_eq!(comms[1].kind, CommunicationKind::Response);
        assert_eq!(comms[2].kind, CommunicationKind::ArtifactCreated);
        assert_eq!(
            comms.iter().map(|c| c.seq).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(comms[0].artifact_id.is_none());
        assert!(comms[2].artifact_id.is_some());
        assert_eq!(comms[2].from_agent, AgentRole::Discovery);
        assert_eq!(comms[2].to_agent, AgentRole::Business);

        assert_eq!(outcome.artifacts.len(), 1);
        let artifact = &outcome.artifacts[0];
        assert_eq!(artifact.artifact_type, ArtifactType::MarketAnalysis);
        assert_eq!(artifact.version, 1);
        assert_eq!(artifact.status, ArtifactStatus::Draft);
        assert_eq!(artifact.created_by_agent, AgentRole::Discovery);
        assert_eq!(comms[2].artifact_id, Some(artifact.artifact_id));
    }

    #[tokio::test]
    async fn test_hop_bound_escalates_instead_of_failing() {
        let fx = fixture(
            vec![
                ScriptStep::reply("[[delegate:discovery]] Validate this.", 100, 10),
                ScriptStep::reply("[[delegate:tech_lead]] Is it buildable?", 100, 10),
                ScriptStep::reply("[[delegate:delivery]] Scope the MVP.", 100, 10),
            ],
            OrchestratorConfig {
                max_delegation_hops: 2,
                ..quick_config()
            },
        )
        .await;

        let outcome = fx
            .orchestrator
            .run_turn(request(&fx, "Take this idea end to end"))
            .await
            .unwrap();

        // The third delegation hits the bound and surfaces a decision.
        assert!(outcome.needs_decision);
        assert!(!outcome.decision_options.is_empty());
        assert_eq!(outcome.usage.total(), 330);

        let pending = fx
            .storage
            .list_pending_decisions(fx.project_id)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].asked_by_agent, AgentRole::TechLead);
        assert_eq!(pending[0].status, DecisionStatus::Pending);

        let comms = fx
            .storage
            .list_communications(outcome.conversation_id, None)
            .await
            .unwrap();
        let delegations = comms
            .iter()
            .filter(|c| c.kind == CommunicationKind::Delegation)
            .count();
        assert_eq!(delegations, 2);
    }

    #[tokio::test]
    async fn test_escalation_directive_persists_decision() {
        let fx = fixture(
            vec![ScriptStep::reply(
                "Only you can pick the model.\n[[escalate]]\n- subscription: Monthly recurring\n- usage: Pay per use",
                150,
                60,
            )],
            quick_config(),
        )
        .await;

        let outcome = fx
            .orchestrator
            .run_turn(request(&fx, "How should we monetize?"))
            .await
            .unwrap();

        assert!(outcome.needs_decision);
        assert_eq!(outcome.decision_options.len(), 2);
        assert_eq!(outcome.decision_options[0].label, "subscription");
        assert_eq!(outcome.decision_options[1].label, "usage");

        let pending = fx
            .storage
            .list_pending_decisions(fx.project_id)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].options.len(), 2);
        assert!(pending[0].question.contains("Only you can pick"));
    }

    #[tokio::test]
    async fn test_artifact_request_hop_produces_document() {
        let fx = fixture(
            vec![
                ScriptStep::reply(
                    "We should write this down.\n[[artifact:tech_spec]] Document the stack.",
                    100,
                    40,
                ),
                ScriptStep::reply(
                    "**TECHNICAL RECOMMENDATION**\nRecommended Stack: axum + Postgres",
                    300,
                    100,
                ),
            ],
            quick_config(),
        )
        .await;

        let outcome = fx
            .orchestrator
            .run_turn(request(&fx, "Put our plan in writing"))
            .await
            .unwrap();

        assert_eq!(outcome.usage.total(), 540);
        assert_eq!(outcome.artifacts.len(), 1);
        let artifact = &outcome.artifacts[0];
        assert_eq!(artifact.artifact_type, ArtifactType::TechSpec);
        assert_eq!(artifact.title, "Tech Spec: SynthMart");
        assert_eq!(artifact.created_by_agent, AgentRole::TechLead);
        assert_eq!(artifact.version, 1);

        let comms = fx
            .storage
            .list_communications(outcome.conversation_id, None)
            .await
            .unwrap();
        assert_eq!(comms.len(), 2);
        assert_eq!(comms[0].kind, CommunicationKind::Request);
        assert_eq!(comms[0].to_agent, AgentRole::TechLead);
        assert_eq!(comms[1].kind, CommunicationKind::ArtifactCreated);

        assert!(outcome.message.contains("**Tech Lead Agent:**"));
        assert!(outcome.message.contains("Recommended Stack"));
    }

    #[tokio::test]
    async fn test_transient_failure_retries_then_succeeds() {
        let fx = fixture(
            vec![
                ScriptStep::fail_transient("connection reset"),
                ScriptStep::reply("All good now.", 10, 5),
            ],
            quick_config(),
        )
        .await;

        let outcome = fx
            .orchestrator
            .run_turn(request(&fx, "hello"))
            .await
            .unwrap();
        assert_eq!(outcome.usage.total(), 15);
        assert_eq!(fx.storage.ledger_entries(fx.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_release_the_hold() {
        let fx = fixture(
            vec![
                ScriptStep::fail_transient("connection reset"),
                ScriptStep::fail_transient("connection reset"),
            ],
            OrchestratorConfig {
                max_invoke_attempts: 2,
                ..quick_config()
            },
        )
        .await;

        let err = fx
            .orchestrator
            .run_turn(request(&fx, "hello"))
            .await
            .unwrap_err();
        match err {
            VentureError::Orchestrator(OrchestratorError::InvocationExhausted {
                attempts, ..
            }) => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {:?}", other),
        }

        // Nothing charged, the hold is gone, and the user message survives.
        assert!(fx.storage.ledger_entries(fx.user_id).await.unwrap().is_empty());
        let (used, _) = fx.storage.usage(fx.user_id).await.unwrap();
        assert_eq!(used, 0);
        let conversations = fx.storage.list_conversations(fx.project_id).await.unwrap();
        assert_eq!(conversations.len(), 1);
        let transcript = fx
            .storage
            .history(conversations[0].conversation_id)
            .await
            .unwrap();
        assert_eq!(transcript.len(), 1);
        // A fresh reservation for a later turn still fits.
        assert!(fx
            .storage
            .reserve(fx.user_id, 1_000)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_permanent_failure_does_not_retry() {
        let fx = fixture(
            vec![
                ScriptStep::fail_permanent("bad request"),
                ScriptStep::reply("never reached", 1, 1),
            ],
            quick_config(),
        )
        .await;

        let err = fx
            .orchestrator
            .run_turn(request(&fx, "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, VentureError::Provider(_)));
        assert!(fx.storage.ledger_entries(fx.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_version_conflict_is_retried_once() {
        let fx = fixture(
            vec![
                ScriptStep::reply("[[delegate:discovery]] Validate.", 100, 50),
                ScriptStep::reply("**DISCOVERY SUMMARY**\nTAM: $4B\nGO", 200, 80),
            ],
            quick_config(),
        )
        .await;
        fx.storage.inject_version_conflict();

        let outcome = fx
            .orchestrator
            .run_turn(request(&fx, "Is the market real?"))
            .await
            .unwrap();
        assert_eq!(outcome.artifacts.len(), 1);
        assert_eq!(outcome.artifacts[0].version, 1);
    }

    #[tokio::test]
    async fn test_foreign_project_is_forbidden() {
        let fx = fixture(vec![], quick_config()).await;
        let intruder = fx
            .storage
            .insert_user(User::new("other@example.com", "Other"))
            .await
            .unwrap();

        let err = fx
            .orchestrator
            .run_turn(TurnRequest {
                user_id: intruder.user_id,
                project_id: fx.project_id,
                conversation_id: None,
                content: "let me in".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VentureError::Authorization(AuthorizationError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_deactivated_account_is_rejected() {
        let fx = fixture(vec![], quick_config()).await;
        fx.storage.set_user_active(fx.user_id, false).await.unwrap();

        let err = fx
            .orchestrator
            .run_turn(request(&fx, "hello"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VentureError::Authorization(AuthorizationError::AccountDeactivated { .. })
        ));
    }

    #[tokio::test]
    async fn test_conversation_must_belong_to_project() {
        let fx = fixture(
            vec![ScriptStep::reply("ok", 10, 5)],
            quick_config(),
        )
        .await;
        let other_project = fx
            .storage
            .insert_project(Project::new(fx.user_id, "Other Project"))
            .await
            .unwrap();
        let foreign_conversation = fx
            .storage
            .get_or_create_conversation(other_project.project_id, None, "seed")
            .await
            .unwrap();

        let err = fx
            .orchestrator
            .run_turn(TurnRequest {
                user_id: fx.user_id,
                project_id: fx.project_id,
                conversation_id: Some(foreign_conversation.conversation_id),
                content: "hello".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VentureError::Orchestrator(OrchestratorError::ConversationProjectMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_sticky_agent_handles_followup() {
        let fx = fixture(
            vec![
                ScriptStep::reply("TAM looks strong.", 100, 40),
                ScriptStep::reply("Competitors are fragmented.", 100, 40),
            ],
            quick_config(),
        )
        .await;

        let first = fx
            .orchestrator
            .run_turn(request(&fx, "Run market research on synth buyers"))
            .await
            .unwrap();
        assert_eq!(first.agent, AgentRole::Discovery);

        let second = fx
            .orchestrator
            .run_turn(TurnRequest {
                user_id: fx.user_id,
                project_id: fx.project_id,
                conversation_id: Some(first.conversation_id),
                content: "And what about the competition?".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(second.agent, AgentRole::Discovery);
    }

    #[tokio::test]
    async fn test_turn_lock_is_evicted_after_the_turn() {
        let fx = fixture(
            vec![
                ScriptStep::reply("First.", 10, 5),
                ScriptStep::reply("Second.", 10, 5),
            ],
            quick_config(),
        )
        .await;

        let first = fx
            .orchestrator
            .run_turn(request(&fx, "hello"))
            .await
            .unwrap();
        assert!(fx.orchestrator.turn_locks.is_empty());

        // A followup in the same conversation takes a fresh lock and evicts
        // it again.
        let second = fx
            .orchestrator
            .run_turn(TurnRequest {
                user_id: fx.user_id,
                project_id: fx.project_id,
                conversation_id: Some(first.conversation_id),
                content: "more".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(second.message, "Second.");
        assert!(fx.orchestrator.turn_locks.is_empty());
    }
}
