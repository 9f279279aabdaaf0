//! VENTURE LLM - Completion provider abstraction
//!
//! Provider-agnostic trait for chat completions, an HTTP implementation
//! speaking the Anthropic messages API, and deterministic mock/scripted
//! providers for tests. The orchestrator only ever sees the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use venture_core::{ProviderError, VentureError, VentureResult};

// ============================================================================
// TOKEN USAGE
// ============================================================================

/// Token counts reported by a provider for one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

impl TokenUsage {
    pub fn new(input_tokens: i64, output_tokens: i64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens consumed by the call.
    pub fn total(&self) -> i64 {
        self.input_tokens + self.output_tokens
    }

    /// Accumulate another call's usage into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// Role of a chat turn sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the transcript sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt for the invoked role.
    pub system: String,
    /// Conversation turns, oldest first. Must end with a user turn.
    pub messages: Vec<ChatMessage>,
    pub max_tokens: i32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
            max_tokens: 2_048,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A completion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
}

// ============================================================================
// COMPLETION PROVIDER TRAIT
// ============================================================================

/// Trait for completion providers.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// struct MyProvider { /* ... */ }
///
/// #[async_trait]
/// impl CompletionProvider for MyProvider {
///     async fn complete(&self, req: &CompletionRequest) -> VentureResult<CompletionResponse> {
///         // Call the provider API
///     }
///     fn provider_id(&self) -> &str { "my-provider" }
/// }
/// ```
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion.
    ///
    /// # Arguments
    /// * `req` - System prompt, transcript, and sampling parameters
    ///
    /// # Returns
    /// * `Ok(CompletionResponse)` - Reply text and token usage
    /// * `Err(VentureError::Provider)` - On failure; `ProviderError::is_transient`
    ///   tells the caller whether a retry is worthwhile
    async fn complete(&self, req: &CompletionRequest) -> VentureResult<CompletionResponse>;

    /// Stable identifier for logging and error messages.
    fn provider_id(&self) -> &str;
}

// ============================================================================
// PROVIDER CONFIG
// ============================================================================

/// Configuration for the HTTP provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: i32,
    pub temperature: f32,
}

impl ProviderConfig {
    /// Create a ProviderConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VENTURE_LLM_API_KEY`: provider API key (required)
    /// - `VENTURE_LLM_BASE_URL`: API base URL (default: https://api.anthropic.com)
    /// - `VENTURE_LLM_MODEL`: model identifier (default: claude-3-5-sonnet-latest)
    /// - `VENTURE_LLM_MAX_TOKENS`: completion cap (default: 2048)
    /// - `VENTURE_LLM_TEMPERATURE`: sampling temperature (default: 0.7)
    pub fn from_env() -> VentureResult<Self> {
        let api_key = std::env::var("VENTURE_LLM_API_KEY").map_err(|_| {
            VentureError::Config(venture_core::ConfigError::MissingRequired {
                field: "VENTURE_LLM_API_KEY".to_string(),
            })
        })?;
        Ok(Self {
            api_key,
            base_url: std::env::var("VENTURE_LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            model: std::env::var("VENTURE_LLM_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-latest".to_string()),
            max_tokens: std::env::var("VENTURE_LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2_048),
            temperature: std::env::var("VENTURE_LLM_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.7),
        })
    }
}

// ============================================================================
// HTTP PROVIDER (Anthropic messages API)
// ============================================================================

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Completion provider speaking the Anthropic messages API over HTTP.
pub struct HttpProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

#[derive(Serialize)]
struct MessagesApiRequest<'a> {
    model: &'a str,
    max_tokens: i32,
    temperature: f32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct MessagesApiResponse {
    model: String,
    content: Vec<ContentBlock>,
    usage: ApiUsage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiUsage {
    input_tokens: i64,
    output_tokens: i64,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn provider_err(&self, transient: bool, message: impl Into<String>) -> VentureError {
        VentureError::Provider(ProviderError::RequestFailed {
            provider: self.provider_id().to_string(),
            transient,
            message: message.into(),
        })
    }
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    async fn complete(&self, req: &CompletionRequest) -> VentureResult<CompletionResponse> {
        let body = MessagesApiRequest {
            model: &self.config.model,
            max_tokens: req.max_tokens.min(self.config.max_tokens),
            temperature: req.temperature,
            system: &req.system,
            messages: &req.messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // Connection-level failures are worth retrying.
                self.provider_err(true, format!("transport error: {}", e))
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(VentureError::Provider(ProviderError::RateLimited {
                provider: self.provider_id().to_string(),
            }));
        }
        if status.is_server_error() {
            return Err(self.provider_err(true, format!("server error: {}", status)));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(self.provider_err(false, format!("status {}: {}", status, detail)));
        }

        let parsed: MessagesApiResponse = response.json().await.map_err(|e| {
            VentureError::Provider(ProviderError::InvalidResponse {
                provider: self.provider_id().to_string(),
                reason: e.to_string(),
            })
        })?;

        let text = parsed
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| {
                VentureError::Provider(ProviderError::InvalidResponse {
                    provider: self.provider_id().to_string(),
                    reason: "empty content".to_string(),
                })
            })?;

        Ok(CompletionResponse {
            text,
            model: parsed.model,
            usage: TokenUsage::new(parsed.usage.input_tokens, parsed.usage.output_tokens),
        })
    }

    fn provider_id(&self) -> &str {
        "anthropic"
    }
}

// ============================================================================
// MOCK PROVIDER
// ============================================================================

/// Provider that always returns the same reply. For tests.
pub struct MockProvider {
    reply: String,
    usage: TokenUsage,
}

impl MockProvider {
    pub fn new(reply: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            reply: reply.into(),
            usage,
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, _req: &CompletionRequest) -> VentureResult<CompletionResponse> {
        Ok(CompletionResponse {
            text: self.reply.clone(),
            model: "mock".to_string(),
            usage: self.usage,
        })
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// SCRIPTED PROVIDER
// ============================================================================

/// One step of a scripted provider run.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Return this reply with this usage.
    Reply { text: String, usage: TokenUsage },
    /// Fail the call. `transient` controls whether the caller retries.
    Fail { transient: bool, message: String },
}

impl ScriptStep {
    pub fn reply(text: impl Into<String>, input_tokens: i64, output_tokens: i64) -> Self {
        ScriptStep::Reply {
            text: text.into(),
            usage: TokenUsage::new(input_tokens, output_tokens),
        }
    }

    pub fn fail_transient(message: impl Into<String>) -> Self {
        ScriptStep::Fail {
            transient: true,
            message: message.into(),
        }
    }

    pub fn fail_permanent(message: impl Into<String>) -> Self {
        ScriptStep::Fail {
            transient: false,
            message: message.into(),
        }
    }
}

/// Provider that plays back a fixed script of steps, one per call.
/// Drives deterministic multi-hop orchestration tests.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ScriptStep>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
        }
    }

    /// Number of unplayed steps.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _req: &CompletionRequest) -> VentureResult<CompletionResponse> {
        let step = {
            let mut script = self
                .script
                .lock()
                .map_err(|_| VentureError::Storage(venture_core::StorageError::LockPoisoned))?;
            script.pop_front()
        };
        match step {
            Some(ScriptStep::Reply { text, usage }) => Ok(CompletionResponse {
                text,
                model: "scripted".to_string(),
                usage,
            }),
            Some(ScriptStep::Fail { transient, message }) => {
                Err(VentureError::Provider(ProviderError::RequestFailed {
                    provider: "scripted".to_string(),
                    transient,
                    message,
                }))
            }
            None => Err(VentureError::Provider(ProviderError::RequestFailed {
                provider: "scripted".to_string(),
                transient: false,
                message: "script exhausted".to_string(),
            })),
        }
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_total_and_add() {
        let mut usage = TokenUsage::new(100, 40);
        assert_eq!(usage.total(), 140);

        usage.add(TokenUsage::new(60, 20));
        assert_eq!(usage.input_tokens, 160);
        assert_eq!(usage.output_tokens, 60);
        assert_eq!(usage.total(), 220);
    }

    #[test]
    fn test_completion_request_builder() {
        let req = CompletionRequest::new("system", vec![ChatMessage::user("hi")])
            .with_max_tokens(512);
        assert_eq!(req.max_tokens, 512);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, ChatRole::User);
    }

    #[test]
    fn test_chat_message_serde_roles() {
        let json = serde_json::to_string(&ChatMessage::assistant("ok")).unwrap();
        assert!(json.contains("\"assistant\""));
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_mock_provider_fixed_reply() {
        let provider = MockProvider::new("hello", TokenUsage::new(10, 5));
        let req = CompletionRequest::new("sys", vec![ChatMessage::user("hi")]);

        let a = provider.complete(&req).await.unwrap();
        let b = provider.complete(&req).await.unwrap();
        assert_eq!(a.text, "hello");
        assert_eq!(b.usage.total(), 15);
    }

    #[tokio::test]
    async fn test_scripted_provider_plays_in_order() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::reply("first", 10, 5),
            ScriptStep::reply("second", 20, 8),
        ]);
        let req = CompletionRequest::new("sys", vec![ChatMessage::user("hi")]);

        assert_eq!(provider.remaining(), 2);
        assert_eq!(provider.complete(&req).await.unwrap().text, "first");
        assert_eq!(provider.complete(&req).await.unwrap().text, "second");
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_scripted_provider_failure_steps() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::fail_transient("connection reset"),
            ScriptStep::fail_permanent("bad request"),
        ]);
        let req = CompletionRequest::new("sys", vec![ChatMessage::user("hi")]);

        let transient = provider.complete(&req).await.unwrap_err();
        match transient {
            VentureError::Provider(e) => assert!(e.is_transient()),
            other => panic!("unexpected error: {:?}", other),
        }

        let permanent = provider.complete(&req).await.unwrap_err();
        match permanent {
            VentureError::Provider(e) => assert!(!e.is_transient()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scripted_provider_exhaustion_is_permanent() {
        let provider = ScriptedProvider::new(vec![]);
        let req = CompletionRequest::new("sys", vec![ChatMessage::user("hi")]);
        let err = provider.complete(&req).await.unwrap_err();
        match err {
            VentureError::Provider(e) => assert!(!e.is_transient()),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_usage_add_is_commutative(
            a_in in 0i64..1_000_000,
            a_out in 0i64..1_000_000,
            b_in in 0i64..1_000_000,
            b_out in 0i64..1_000_000,
        ) {
            let mut left = TokenUsage::new(a_in, a_out);
            left.add(TokenUsage::new(b_in, b_out));

            let mut right = TokenUsage::new(b_in, b_out);
            right.add(TokenUsage::new(a_in, a_out));

            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_usage_total_is_sum(
            input in 0i64..1_000_000,
            output in 0i64..1_000_000,
        ) {
            let usage = TokenUsage::new(input, output);
            prop_assert_eq!(usage.total(), input + output);
        }
    }
}
