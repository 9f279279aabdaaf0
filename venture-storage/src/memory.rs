//! In-memory reference implementation of the storage contracts.
//!
//! Every table is a `RwLock`-guarded map or vector; the invariants the
//! contracts promise (sequence assignment, version assignment, ledger
//! admission) are carried by doing the read-check-write inside one guard.
//! Lock order where two guards are needed: ledger, then users.

use crate::traits::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;
use venture_core::{
    now, AgentCommunication, AgentRole, AgentRoleConfig, Artifact, ArtifactId, ArtifactStatus,
    ArtifactType, CommunicationId, Conversation, ConversationId, Decision, DecisionId,
    EntityIdType, EntityType, LedgerEntryId, LedgerError, Message, NewArtifact, NewCommunication,
    Project, ProjectId, StorageError, TokenLedgerEntry, User, UserId, VentureError,
    VentureResult,
};

#[derive(Default)]
struct CommState {
    records: Vec<AgentCommunication>,
    next_seq: HashMap<ConversationId, u64>,
}

#[derive(Default)]
struct ArtifactState {
    records: Vec<Artifact>,
    /// Test hook: fail the next create with a version conflict.
    inject_conflict: bool,
}

#[derive(Default)]
struct LedgerState {
    holds: HashMap<Uuid, Reservation>,
    outstanding: HashMap<UserId, i64>,
    entries: Vec<TokenLedgerEntry>,
}

#[derive(Default)]
struct Inner {
    users: RwLock<HashMap<UserId, User>>,
    projects: RwLock<HashMap<ProjectId, Project>>,
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
    messages: RwLock<Vec<Message>>,
    comms: RwLock<CommState>,
    artifacts: RwLock<ArtifactState>,
    ledger: Mutex<LedgerState>,
    decisions: RwLock<HashMap<DecisionId, Decision>>,
    role_configs: RwLock<HashMap<AgentRole, AgentRoleConfig>>,
}

/// In-memory storage backing the engine and the API.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: make the next `create_artifact_version` fail with a
    /// version conflict, exercising the caller's retry path.
    pub fn inject_version_conflict(&self) {
        if let Ok(mut state) = self.inner.artifacts.write() {
            state.inject_conflict = true;
        }
    }
}

fn poisoned<T>(_: T) -> VentureError {
    VentureError::Storage(StorageError::LockPoisoned)
}

fn not_found(entity_type: EntityType, id: Uuid) -> VentureError {
    VentureError::Storage(StorageError::NotFound { entity_type, id })
}

// ============================================================================
// USERS
// ============================================================================

#[async_trait]
impl UserStore for MemoryStorage {
    async fn insert_user(&self, user: User) -> VentureResult<User> {
        let mut users = self.inner.users.write().map_err(poisoned)?;
        users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: UserId) -> VentureResult<User> {
        let users = self.inner.users.read().map_err(poisoned)?;
        users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| not_found(EntityType::User, user_id.as_uuid()))
    }

    async fn get_user_by_email(&self, email: &str) -> VentureResult<User> {
        let users = self.inner.users.read().map_err(poisoned)?;
        users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| not_found(EntityType::User, Uuid::nil()))
    }

    async fn list_users(&self) -> VentureResult<Vec<User>> {
        let users = self.inner.users.read().map_err(poisoned)?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.user_id);
        Ok(all)
    }

    async fn set_user_active(&self, user_id: UserId, active: bool) -> VentureResult<User> {
        let mut users = self.inner.users.write().map_err(poisoned)?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| not_found(EntityType::User, user_id.as_uuid()))?;
        user.is_active = active;
        Ok(user.clone())
    }
}

// ============================================================================
// PROJECTS
// ============================================================================

#[async_trait]
impl ProjectStore for MemoryStorage {
    async fn insert_project(&self, project: Project) -> VentureResult<Project> {
        let mut projects = self.inner.projects.write().map_err(poisoned)?;
        projects.insert(project.project_id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, project_id: ProjectId) -> VentureResult<Project> {
        let projects = self.inner.projects.read().map_err(poisoned)?;
        projects
            .get(&project_id)
            .cloned()
            .ok_or_else(|| not_found(EntityType::Project, project_id.as_uuid()))
    }

    async fn list_projects_for_owner(&self, owner_id: UserId) -> VentureResult<Vec<Project>> {
        let projects = self.inner.projects.read().map_err(poisoned)?;
        let mut owned: Vec<Project> = projects
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|p| p.project_id);
        Ok(owned)
    }

    async fn count_projects(&self) -> VentureResult<usize> {
        let projects = self.inner.projects.read().map_err(poisoned)?;
        Ok(projects.len())
    }
}

// ============================================================================
// CONVERSATIONS & TRANSCRIPT
// ============================================================================

#[async_trait]
impl ConversationStore for MemoryStorage {
    async fn get_or_create_conversation(
        &self,
        project_id: ProjectId,
        conversation_id: Option<ConversationId>,
        title_seed: &str,
    ) -> VentureResult<Conversation> {
        let mut conversations = self.inner.conversations.write().map_err(poisoned)?;
        match conversation_id {
            Some(id) => conversations
                .get(&id)
                .cloned()
                .ok_or_else(|| not_found(EntityType::Conversation, id.as_uuid())),
            None => {
                let conversation = Conversation::new(project_id, title_seed);
                conversations.insert(conversation.conversation_id, conversation.clone());
                Ok(conversation)
            }
        }
    }

    async fn get_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> VentureResult<Conversation> {
        let conversations = self.inner.conversations.read().map_err(poisoned)?;
        conversations
            .get(&conversation_id)
            .cloned()
            .ok_or_else(|| not_found(EntityType::Conversation, conversation_id.as_uuid()))
    }

    async fn list_conversations(&self, project_id: ProjectId) -> VentureResult<Vec<Conversation>> {
        let conversations = self.inner.conversations.read().map_err(poisoned)?;
        let mut threads: Vec<Conversation> = conversations
            .values()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        threads.sort_by_key(|c| c.conversation_id);
        Ok(threads)
    }

    async fn append_message(&self, message: Message) -> VentureResult<Message> {
        {
            let conversations = self.inner.conversations.read().map_err(poisoned)?;
            if !conversations.contains_key(&message.conversation_id) {
                return Err(not_found(
                    EntityType::Conversation,
                    message.conversation_id.as_uuid(),
                ));
            }
        }
        let mut messages = self.inner.messages.write().map_err(poisoned)?;
        messages.push(message.clone());
        Ok(message)
    }

    async fn history(&self, conversation_id: ConversationId) -> VentureResult<Vec<Message>> {
        let messages = self.inner.messages.read().map_err(poisoned)?;
        Ok(messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn set_current_agent(
        &self,
        conversation_id: ConversationId,
        agent: AgentRole,
    ) -> VentureResult<()> {
        let mut conversations = self.inner.conversations.write().map_err(poisoned)?;
        let conversation = conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| not_found(EntityType::Conversation, conversation_id.as_uuid()))?;
        conversation.current_agent = Some(agent);
        Ok(())
    }
}

// ============================================================================
// COMMUNICATION LOG
// ============================================================================

#[async_trait]
impl CommunicationLog for MemoryStorage {
    async fn append_communication(
        &self,
        comm: NewCommunication,
    ) -> VentureResult<AgentCommunication> {
        let mut state = self.inner.comms.write().map_err(poisoned)?;
        // Sequence assignment and insert happen under one guard, so readers
        // never observe a gap or a duplicate.
        let seq = state
            .next_seq
            .entry(comm.conversation_id)
            .and_modify(|s| *s += 1)
            .or_insert(1);
        let record = AgentCommunication {
            communication_id: CommunicationId::now_v7(),
            conversation_id: comm.conversation_id,
            project_id: comm.project_id,
            seq: *seq,
            from_agent: comm.from_agent,
            to_agent: comm.to_agent,
            kind: comm.kind,
            content: comm.content,
            artifact_id: comm.artifact_id,
            created_at: now(),
        };
        state.records.push(record.clone());
        Ok(record)
    }

    async fn list_communications(
        &self,
        conversation_id: ConversationId,
        limit: Option<usize>,
    ) -> VentureResult<Vec<AgentCommunication>> {
        let state = self.inner.comms.read().map_err(poisoned)?;
        let mut records: Vec<AgentCommunication> = state
            .records
            .iter()
            .filter(|c| c.conversation_id == conversation_id)
            .cloned()
            .collect();
        records.sort_by_key(|c| c.seq);
        if let Some(limit) = limit {
            let skip = records.len().saturating_sub(limit);
            records.drain(..skip);
        }
        Ok(records)
    }

    async fn list_project_communications(
        &self,
        project_id: ProjectId,
        limit: Option<usize>,
    ) -> VentureResult<Vec<AgentCommunication>> {
        let state = self.inner.comms.read().map_err(poisoned)?;
        let mut records: Vec<AgentCommunication> = state
            .records
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        records.sort_by_key(|c| (c.conversation_id, c.seq));
        if let Some(limit) = limit {
            let skip = records.len().saturating_sub(limit);
            records.drain(..skip);
        }
        Ok(records)
    }
}

// ============================================================================
// ARTIFACTS
// ============================================================================

#[async_trait]
impl ArtifactStore for MemoryStorage {
    async fn create_artifact_version(&self, draft: NewArtifact) -> VentureResult<Artifact> {
        let mut state = self.inner.artifacts.write().map_err(poisoned)?;
        let next_version = state
            .records
            .iter()
            .filter(|a| a.project_id == draft.project_id && a.artifact_type == draft.artifact_type)
            .map(|a| a.version)
            .max()
            .unwrap_or(0)
            + 1;

        if state.inject_conflict {
            state.inject_conflict = false;
            return Err(VentureError::Storage(StorageError::VersionConflict {
                project_id: draft.project_id.as_uuid(),
                family: draft.artifact_type.as_db_str().to_string(),
                version: next_version,
            }));
        }

        let artifact = draft.into_artifact(next_version);
        state.records.push(artifact.clone());
        Ok(artifact)
    }

    async fn get_artifact(&self, artifact_id: ArtifactId) -> VentureResult<Artifact> {
        let state = self.inner.artifacts.read().map_err(poisoned)?;
        state
            .records
            .iter()
            .find(|a| a.artifact_id == artifact_id)
            .cloned()
            .ok_or_else(|| not_found(EntityType::Artifact, artifact_id.as_uuid()))
    }

    async fn latest_artifacts(
        &self,
        project_id: ProjectId,
        artifact_type: Option<ArtifactType>,
    ) -> VentureResult<Vec<Artifact>> {
        let state = self.inner.artifacts.read().map_err(poisoned)?;
        let mut latest: HashMap<ArtifactType, Artifact> = HashMap::new();
        for artifact in state.records.iter().filter(|a| {
            a.project_id == project_id
                && artifact_type.map(|t| a.artifact_type == t).unwrap_or(true)
        }) {
            match latest.get(&artifact.artifact_type) {
                Some(existing) if existing.version >= artifact.version => {}
                _ => {
                    latest.insert(artifact.artifact_type, artifact.clone());
                }
            }
        }
        let mut result: Vec<Artifact> = latest.into_values().collect();
        result.sort_by_key(|a| a.artifact_type.as_db_str());
        Ok(result)
    }

    async fn artifact_versions(
        &self,
        project_id: ProjectId,
        artifact_type: ArtifactType,
    ) -> VentureResult<Vec<Artifact>> {
        let state = self.inner.artifacts.read().map_err(poisoned)?;
        let mut versions: Vec<Artifact> = state
            .records
            .iter()
            .filter(|a| a.project_id == project_id && a.artifact_type == artifact_type)
            .cloned()
            .collect();
        versions.sort_by_key(|a| a.version);
        Ok(versions)
    }

    async fn transition_artifact(
        &self,
        artifact_id: ArtifactId,
        status: ArtifactStatus,
    ) -> VentureResult<Artifact> {
        let mut state = self.inner.artifacts.write().map_err(poisoned)?;
        let artifact = state
            .records
            .iter_mut()
            .find(|a| a.artifact_id == artifact_id)
            .ok_or_else(|| not_found(EntityType::Artifact, artifact_id.as_uuid()))?;
        if !artifact.status.can_transition_to(status) {
            return Err(VentureError::Storage(StorageError::InvalidTransition {
                from: artifact.status.as_db_str().to_string(),
                to: status.as_db_str().to_string(),
            }));
        }
        artifact.status = status;
        Ok(artifact.clone())
    }
}

// ============================================================================
// TOKEN LEDGER
// ============================================================================

#[async_trait]
impl TokenLedger for MemoryStorage {
    async fn reserve(&self, user_id: UserId, estimate: i64) -> VentureResult<Reservation> {
        let mut ledger = self.inner.ledger.lock().map_err(poisoned)?;
        let (used, limit, active) = {
            let users = self.inner.users.read().map_err(poisoned)?;
            let user = users
                .get(&user_id)
                .ok_or_else(|| not_found(EntityType::User, user_id.as_uuid()))?;
            (user.tokens_used, user.token_limit, user.is_active)
        };
        if !active {
            return Err(VentureError::Ledger(LedgerError::AccountInactive {
                user_id: user_id.as_uuid(),
            }));
        }
        let outstanding = ledger.outstanding.get(&user_id).copied().unwrap_or(0);
        if used + outstanding + estimate > limit {
            return Err(VentureError::Ledger(LedgerError::QuotaExceeded {
                user_id: user_id.as_uuid(),
                used,
                limit,
                requested: estimate,
            }));
        }
        let reservation = Reservation {
            reservation_id: Uuid::now_v7(),
            user_id,
            amount: estimate,
        };
        ledger
            .holds
            .insert(reservation.reservation_id, reservation.clone());
        *ledger.outstanding.entry(user_id).or_insert(0) += estimate;
        Ok(reservation)
    }

    async fn commit(
        &self,
        reservation: Reservation,
        input_tokens: i64,
        output_tokens: i64,
        scope: ChargeScope,
    ) -> VentureResult<TokenLedgerEntry> {
        let mut ledger = self.inner.ledger.lock().map_err(poisoned)?;
        let hold = ledger
            .holds
            .remove(&reservation.reservation_id)
            .ok_or_else(|| {
                VentureError::Ledger(LedgerError::UnknownReservation {
                    reservation_id: reservation.reservation_id,
                })
            })?;
        if let Some(outstanding) = ledger.outstanding.get_mut(&hold.user_id) {
            *outstanding -= hold.amount;
        }

        let charged = {
            let mut users = self.inner.users.write().map_err(poisoned)?;
            let user = users
                .get_mut(&hold.user_id)
                .ok_or_else(|| not_found(EntityType::User, hold.user_id.as_uuid()))?;
            // Admission was checked against the estimate; if the actual
            // usage overran the remaining headroom, the overrun is forgiven
            // rather than pushing the counter past the cap.
            let headroom = (user.token_limit - user.tokens_used).max(0);
            let charged = (input_tokens + output_tokens).min(headroom);
            user.tokens_used += charged;
            charged
        };

        let entry = TokenLedgerEntry {
            entry_id: LedgerEntryId::now_v7(),
            user_id: hold.user_id,
            project_id: scope.project_id,
            conversation_id: scope.conversation_id,
            agent: scope.agent,
            input_tokens,
            output_tokens,
            charged,
            created_at: now(),
        };
        ledger.entries.push(entry.clone());
        Ok(entry)
    }

    async fn release(&self, reservation: Reservation) -> VentureResult<()> {
        let mut ledger = self.inner.ledger.lock().map_err(poisoned)?;
        let hold = ledger
            .holds
            .remove(&reservation.reservation_id)
            .ok_or_else(|| {
                VentureError::Ledger(LedgerError::UnknownReservation {
                    reservation_id: reservation.reservation_id,
                })
            })?;
        if let Some(outstanding) = ledger.outstanding.get_mut(&hold.user_id) {
            *outstanding -= hold.amount;
        }
        Ok(())
    }

    async fn usage(&self, user_id: UserId) -> VentureResult<(i64, i64)> {
        let users = self.inner.users.read().map_err(poisoned)?;
        let user = users
            .get(&user_id)
            .ok_or_else(|| not_found(EntityType::User, user_id.as_uuid()))?;
        Ok((user.tokens_used, user.token_limit))
    }

    async fn ledger_entries(&self, user_id: UserId) -> VentureResult<Vec<TokenLedgerEntry>> {
        let ledger = self.inner.ledger.lock().map_err(poisoned)?;
        Ok(ledger
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn set_token_limit(&self, user_id: UserId, limit: i64) -> VentureResult<User> {
        let mut users = self.inner.users.write().map_err(poisoned)?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| not_found(EntityType::User, user_id.as_uuid()))?;
        user.token_limit = limit;
        Ok(user.clone())
    }

    async fn reset_tokens(&self, user_id: UserId) -> VentureResult<User> {
        let mut users = self.inner.users.write().map_err(poisoned)?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| not_found(EntityType::User, user_id.as_uuid()))?;
        user.tokens_used = 0;
        Ok(user.clone())
    }
}

// ============================================================================
// DECISIONS
// ============================================================================

#[async_trait]
impl DecisionStore for MemoryStorage {
    async fn insert_decision(&self, decision: Decision) -> VentureResult<Decision> {
        let mut decisions = self.inner.decisions.write().map_err(poisoned)?;
        decisions.insert(decision.decision_id, decision.clone());
        Ok(decision)
    }

    async fn get_decision(&self, decision_id: DecisionId) -> VentureResult<Decision> {
        let decisions = self.inner.decisions.read().map_err(poisoned)?;
        decisions
            .get(&decision_id)
            .cloned()
            .ok_or_else(|| not_found(EntityType::Decision, decision_id.as_uuid()))
    }

    async fn resolve_decision(
        &self,
        decision_id: DecisionId,
        chosen_option: &str,
        reasoning: Option<String>,
    ) -> VentureResult<Decision> {
        let mut decisions = self.inner.decisions.write().map_err(poisoned)?;
        let decision = decisions
            .get_mut(&decision_id)
            .ok_or_else(|| not_found(EntityType::Decision, decision_id.as_uuid()))?;
        if !decision.is_pending() {
            return Err(VentureError::Validation(
                venture_core::ValidationError::InvalidValue {
                    field: "decision_id".to_string(),
                    reason: "decision is not pending".to_string(),
                },
            ));
        }
        decision.resolve(chosen_option, reasoning);
        Ok(decision.clone())
    }

    async fn list_pending_decisions(
        &self,
        project_id: ProjectId,
    ) -> VentureResult<Vec<Decision>> {
        let decisions = self.inner.decisions.read().map_err(poisoned)?;
        let mut pending: Vec<Decision> = decisions
            .values()
            .filter(|d| d.project_id == project_id && d.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|d| d.decision_id);
        Ok(pending)
    }
}

// ============================================================================
// ROLE CONFIG
// ============================================================================

#[async_trait]
impl RoleConfigStore for MemoryStorage {
    async fn get_role_config(&self, role: AgentRole) -> VentureResult<AgentRoleConfig> {
        let configs = self.inner.role_configs.read().map_err(poisoned)?;
        Ok(configs
            .get(&role)
            .cloned()
            .unwrap_or_else(|| AgentRoleConfig::new(role)))
    }

    async fn list_role_configs(&self) -> VentureResult<Vec<AgentRoleConfig>> {
        let configs = self.inner.role_configs.read().map_err(poisoned)?;
        Ok(AgentRole::ALL
            .iter()
            .map(|role| {
                configs
                    .get(role)
                    .cloned()
                    .unwrap_or_else(|| AgentRoleConfig::new(*role))
            })
            .collect())
    }

    async fn update_role_config(
        &self,
        role: AgentRole,
        custom_prompt: Option<String>,
        use_custom_prompt: bool,
    ) -> VentureResult<AgentRoleConfig> {
        if use_custom_prompt && custom_prompt.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(VentureError::Validation(
                venture_core::ValidationError::RequiredFieldMissing {
                    field: "custom_prompt".to_string(),
                },
            ));
        }
        let mut configs = self.inner.role_configs.write().map_err(poisoned)?;
        let config = configs.entry(role).or_insert_with(|| AgentRoleConfig::new(role));
        config.custom_prompt = custom_prompt;
        config.use_custom_prompt = use_custom_prompt;
        Ok(config.clone())
    }

    async fn reset_role_config(&self, role: AgentRole) -> VentureResult<AgentRoleConfig> {
        let mut configs = self.inner.role_configs.write().map_err(poisoned)?;
        let config = configs.entry(role).or_insert_with(|| AgentRoleConfig::new(role));
        config.reset();
        Ok(config.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use venture_core::CommunicationKind;

    #[derive(Debug, Clone)]
    enum LedgerOp {
        Reserve(i64),
        CommitLast { input: i64, output: i64 },
        ReleaseLast,
    }

    fn arb_ledger_op() -> impl Strategy<Value = LedgerOp> {
        prop_oneof![
            (1i64..4_000).prop_map(LedgerOp::Reserve),
            ((0i64..3_000), (0i64..3_000))
                .prop_map(|(input, output)| LedgerOp::CommitLast { input, output }),
            Just(LedgerOp::ReleaseLast),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any interleaving of reserve/commit/release keeps tokens_used at
        /// or below the limit, and every entry's charge is non-negative.
        #[test]
        fn prop_ledger_never_exceeds_limit(
            limit in 1_000i64..30_000,
            ops in proptest::collection::vec(arb_ledger_op(), 1..40),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async move {
                let storage = MemoryStorage::new();
                let user = storage
                    .insert_user(User::new("p@example.com", "P").with_token_limit(limit))
                    .await
                    .unwrap();
                let scope = ChargeScope {
                    project_id: ProjectId::now_v7(),
                    conversation_id: ConversationId::now_v7(),
                    agent: AgentRole::Business,
                };

                let mut open: Vec<Reservation> = Vec::new();
                for op in ops {
                    match op {
                        LedgerOp::Reserve(estimate) => {
                            if let Ok(r) = storage.reserve(user.user_id, estimate).await {
                                open.push(r);
                            }
                        }
                        LedgerOp::CommitLast { input, output } => {
                            if let Some(r) = open.pop() {
                                let entry =
                                    storage.commit(r, input, output, scope).await.unwrap();
                                assert!(entry.charged >= 0);
                            }
                        }
                        LedgerOp::ReleaseLast => {
                            if let Some(r) = open.pop() {
                                storage.release(r).await.unwrap();
                            }
                        }
                    }
                    let (used, lim) = storage.usage(user.user_id).await.unwrap();
                    assert!(used <= lim, "used {} exceeded limit {}", used, lim);
                }

                // Committed charges sum to tokens_used.
                let entries = storage.ledger_entries(user.user_id).await.unwrap();
                let (used, _) = storage.usage(user.user_id).await.unwrap();
                assert_eq!(entries.iter().map(|e| e.charged).sum::<i64>(), used);
            });
        }

        /// Versions in every family are contiguous from 1 regardless of the
        /// creation order across families.
        #[test]
        fn prop_artifact_versions_contiguous(
            families in proptest::collection::vec(0usize..7, 1..30),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async move {
                let storage = MemoryStorage::new();
                let project_id = ProjectId::now_v7();
                for idx in families {
                    let ty = ArtifactType::ALL[idx];
                    storage
                        .create_artifact_version(NewArtifact::new(
                            project_id,
                            ty,
                            "doc",
                            "content",
                            AgentRole::owner_of(ty),
                        ))
                        .await
                        .unwrap();
                }
                for ty in ArtifactType::ALL {
                    let versions = storage.artifact_versions(project_id, *ty).await.unwrap();
                    for (i, artifact) in versions.iter().enumerate() {
                        assert_eq!(artifact.version, i as i32 + 1);
                    }
                }
            });
        }

        /// Sequence numbers are strictly increasing per conversation under
        /// interleaved appends across conversations.
        #[test]
        fn prop_communication_seq_strictly_increasing(
            picks in proptest::collection::vec(0usize..3, 1..40),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async move {
                let storage = MemoryStorage::new();
                let project_id = ProjectId::now_v7();
                let convs = [
                    ConversationId::now_v7(),
                    ConversationId::now_v7(),
                    ConversationId::now_v7(),
                ];
                for pick in picks {
                    storage
                        .append_communication(NewCommunication::new(
                            convs[pick],
                            project_id,
                            AgentRole::Business,
                            AgentRole::Discovery,
                            CommunicationKind::StatusUpdate,
                            "tick",
                        ))
                        .await
                        .unwrap();
                }
                for conv in convs {
                    let records = storage.list_communications(conv, None).await.unwrap();
                    for (i, record) in records.iter().enumerate() {
                        assert_eq!(record.seq, i as u64 + 1);
                    }
                }
            });
        }
    }
}
