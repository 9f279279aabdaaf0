//! Agent invocation runtime.
//!
//! One `invoke` call: assemble the prompt for a role, run the completion
//! provider under a wall-clock bound, and classify the reply into the next
//! orchestration step. Retry policy lives in the engine, not here.

use crate::classifier::{ActionClassifier, AgentAction, MarkerClassifier};
use crate::roles::{directive_guide, RoleConfigSet};
use std::sync::Arc;
use std::time::Duration;
use venture_core::{AgentRole, ProjectContext, ProviderError, VentureError, VentureResult};
use venture_llm::{ChatMessage, CompletionProvider, CompletionRequest, TokenUsage};

/// Transcript turns included per invocation, newest last.
pub const HISTORY_WINDOW: usize = 20;

/// Everything an agent sees for one invocation.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub project_name: String,
    pub project_description: Option<String>,
    pub project_context: ProjectContext,
    /// Prior transcript, oldest first, already windowed by the caller or not.
    pub history: Vec<ChatMessage>,
    /// The message the invoked role must answer. For delegated hops this is
    /// the delegation instruction, not the user's original text.
    pub prompt: String,
}

/// Result of one agent invocation.
#[derive(Debug, Clone)]
pub struct InvokeOutcome {
    pub reply: String,
    pub action: AgentAction,
    pub usage: TokenUsage,
}

/// Invokes roles against a completion provider.
pub struct AgentRuntime {
    provider: Arc<dyn CompletionProvider>,
    classifier: Arc<dyn ActionClassifier>,
    invoke_timeout: Duration,
}

impl AgentRuntime {
    pub fn new(provider: Arc<dyn CompletionProvider>, invoke_timeout: Duration) -> Self {
        Self {
            provider,
            classifier: Arc::new(MarkerClassifier::new()),
            invoke_timeout,
        }
    }

    /// Swap the action classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ActionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Invoke one role.
    ///
    /// # Arguments
    /// * `role` - The agent to invoke
    /// * `ctx` - Project context, transcript window, and the prompt to answer
    /// * `configs` - Per-role prompt overrides
    ///
    /// # Returns
    /// * `Ok(InvokeOutcome)` - Reply text, classified action, token usage
    /// * `Err(VentureError::Provider)` - Timeout or provider failure;
    ///   transience decides whether the engine retries
    pub async fn invoke(
        &self,
        role: AgentRole,
        ctx: &TurnContext,
        configs: &RoleConfigSet,
    ) -> VentureResult<InvokeOutcome> {
        let request = self.build_request(role, ctx, configs);

        let response = tokio::time::timeout(self.invoke_timeout, self.provider.complete(&request))
            .await
            .map_err(|_| {
                VentureError::Provider(ProviderError::Timeout {
                    provider: self.provider.provider_id().to_string(),
                    timeout_ms: self.invoke_timeout.as_millis() as u64,
                })
            })??;

        let action = self.classifier.classify(role, &response.text);
        tracing::debug!(
            %role,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "agent invocation complete"
        );

        Ok(InvokeOutcome {
            reply: response.text,
            action,
            usage: response.usage,
        })
    }

    fn build_request(
        &self,
        role: AgentRole,
        ctx: &TurnContext,
        configs: &RoleConfigSet,
    ) -> CompletionRequest {
        let system = format!("{}\n{}", configs.system_prompt(role), directive_guide());

        let mut messages = Vec::with_capacity(ctx.history.len() + 3);
        let context_block = format_project_context(ctx);
        if !context_block.is_empty() {
            messages.push(ChatMessage::user(format!(
                "[PROJECT CONTEXT]\n{}",
                context_block
            )));
            messages.push(ChatMessage::assistant(
                "Noted. How can I help with this project?",
            ));
        }

        let skip = ctx.history.len().saturating_sub(HISTORY_WINDOW);
        messages.extend(ctx.history.iter().skip(skip).cloned());
        messages.push(ChatMessage::user(ctx.prompt.clone()));

        CompletionRequest::new(system, messages)
    }
}

/// Render the project context block sent ahead of the transcript.
fn format_project_context(ctx: &TurnContext) -> String {
    let mut lines = vec![format!("Project: {}", ctx.project_name)];
    if let Some(description) = &ctx.project_description {
        lines.push(format!("Description: {}", description));
    }
    let pc = &ctx.project_context;
    if let Some(goal) = &pc.business_goal {
        lines.push(format!("Business goal: {}", goal));
    }
    if let Some(audience) = &pc.target_audience {
        lines.push(format!("Target audience: {}", audience));
    }
    if let Some(arpu) = pc.arpu_usd {
        lines.push(format!("ARPU: ${:.2}", arpu));
    }
    if let Some(cac) = pc.estimated_cac_usd {
        lines.push(format!("Estimated CAC: ${:.2}", cac));
    }
    if let Some(ltv) = pc.estimated_ltv_usd {
        lines.push(format!("Estimated LTV: ${:.2}", ltv));
    }
    if let Some(ratio) = pc.ltv_cac_ratio() {
        lines.push(format!("LTV:CAC ratio: {:.2}", ratio));
    }
    lines.push(format!(
        "Priorities (1-10): speed {}, quality {}, cost {}",
        pc.speed_priority, pc.quality_priority, pc.cost_priority
    ));
    lines.join("\n")
}

// =============================================================================
// TESTS
// =============================================================================
