//! VENTURE API Server Entry Point
//!
//! Bootstraps configuration, storage, the completion provider, and the
//! orchestrator, then starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use venture_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use venture_core::{EntityIdType, OrchestratorConfig, User, UserRole};
use venture_engine::Orchestrator;
use venture_llm::{CompletionProvider, HttpProvider, MockProvider, ProviderConfig, TokenUsage};
use venture_storage::{MemoryStorage, Storage, UserStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "venture_api=debug,venture_engine=debug,info".into()),
        )
        .init();

    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    seed_dev_user(storage.as_ref()).await?;

    let provider: Arc<dyn CompletionProvider> = match ProviderConfig::from_env() {
        Ok(config) => Arc::new(HttpProvider::new(config)),
        Err(e) => {
            tracing::warn!(error = %e, "no completion provider configured, using mock replies");
            Arc::new(MockProvider::new(
                "I can help with that once a completion provider is configured.",
                TokenUsage::new(0, 0),
            ))
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(
        storage.clone(),
        provider,
        OrchestratorConfig::from_env(),
    ));

    let api_config = ApiConfig::from_env();
    let app: Router = create_api_router(AppState::new(storage, orchestrator), &api_config);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting VENTURE API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// With the in-memory backend an empty user table makes every request 401,
/// so development boots seed one admin account unless disabled via
/// `VENTURE_SEED_DEV_USER=false`.
async fn seed_dev_user(storage: &dyn Storage) -> ApiResult<()> {
    let enabled = std::env::var("VENTURE_SEED_DEV_USER")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true);
    if !enabled {
        return Ok(());
    }

    let user = storage
        .insert_user(User::new("dev@venture.local", "Dev Admin").with_role(UserRole::Admin))
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to seed dev user: {}", e)))?;
    tracing::info!(user_id = %user.user_id.as_uuid(), "Seeded development admin user");
    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("VENTURE_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("VENTURE_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
