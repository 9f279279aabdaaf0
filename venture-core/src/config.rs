//! Orchestration tunables.
//!
//! Loaded from environment variables with development defaults, following
//! the same pattern as the API-level configuration.

/// Configuration for the turn orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum agent-to-agent hops within a single turn. Reaching the bound
    /// escalates to the user; it never fails the turn.
    pub max_delegation_hops: u32,

    /// Whether artifact-generation hops consume the shared hop budget.
    pub artifact_hops_share_budget: bool,

    /// Attempts per provider call (first try + retries) for transient
    /// failures.
    pub max_invoke_attempts: u32,

    /// Base backoff between retries, milliseconds. Doubles per retry.
    pub backoff_base_ms: u64,

    /// Backoff ceiling, milliseconds.
    pub backoff_cap_ms: u64,

    /// Wall-clock bound on a single provider call, milliseconds.
    pub invoke_timeout_ms: u64,

    /// Token estimate reserved ahead of each provider call.
    pub reserve_estimate: i64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_delegation_hops: 4,
            artifact_hops_share_budget: true,
            max_invoke_attempts: 3,
            backoff_base_ms: 200,
            backoff_cap_ms: 2_000,
            invoke_timeout_ms: 30_000,
            reserve_estimate: 2_000,
        }
    }
}

impl OrchestratorConfig {
    /// Create an OrchestratorConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VENTURE_MAX_DELEGATION_HOPS`: hop bound per turn (default: 4)
    /// - `VENTURE_ARTIFACT_HOPS_SHARE_BUDGET`: "true" or "false" (default: true)
    /// - `VENTURE_MAX_INVOKE_ATTEMPTS`: attempts per provider call (default: 3)
    /// - `VENTURE_BACKOFF_BASE_MS`: retry backoff base (default: 200)
    /// - `VENTURE_BACKOFF_CAP_MS`: retry backoff ceiling (default: 2000)
    /// - `VENTURE_INVOKE_TIMEOUT_MS`: provider call timeout (default: 30000)
    /// - `VENTURE_RESERVE_ESTIMATE`: tokens reserved per call (default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_delegation_hops: env_parse("VENTURE_MAX_DELEGATION_HOPS")
                .unwrap_or(defaults.max_delegation_hops),
            artifact_hops_share_budget: std::env::var("VENTURE_ARTIFACT_HOPS_SHARE_BUDGET")
                .ok()
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(defaults.artifact_hops_share_budget),
            max_invoke_attempts: env_parse("VENTURE_MAX_INVOKE_ATTEMPTS")
                .unwrap_or(defaults.max_invoke_attempts),
            backoff_base_ms: env_parse("VENTURE_BACKOFF_BASE_MS")
                .unwrap_or(defaults.backoff_base_ms),
            backoff_cap_ms: env_parse("VENTURE_BACKOFF_CAP_MS").unwrap_or(defaults.backoff_cap_ms),
            invoke_timeout_ms: env_parse("VENTURE_INVOKE_TIMEOUT_MS")
                .unwrap_or(defaults.invoke_timeout_ms),
            reserve_estimate: env_parse("VENTURE_RESERVE_ESTIMATE")
                .unwrap_or(defaults.reserve_estimate),
        }
    }

    /// Backoff delay before retry `attempt` (1-based), capped.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let shifted = self
            .backoff_base_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
        shifted.min(self.backoff_cap_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
