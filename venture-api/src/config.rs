//! API Configuration Module
//!
//! Configuration for CORS and other API-level settings, loaded from
//! environment variables with sensible defaults for development.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS and request handling.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Request body size cap in bytes.
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_max_age_secs: 86_400,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VENTURE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `VENTURE_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `VENTURE_MAX_BODY_BYTES`: Request body cap (default: 1048576)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cors_origins = std::env::var("VENTURE_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            cors_origins,
            cors_max_age_secs: env_parse("VENTURE_CORS_MAX_AGE_SECS")
                .unwrap_or(defaults.cors_max_age_secs),
            max_body_bytes: env_parse("VENTURE_MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
