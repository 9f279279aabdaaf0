//! Shared application state for Axum routers.

use std::sync::Arc;

use venture_engine::Orchestrator;
use venture_storage::Storage;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend. Routes read through the traits; only the engine
    /// writes turn state.
    pub storage: Arc<dyn Storage>,
    /// The turn orchestrator; `POST /chat/message` is its only caller.
    pub orchestrator: Arc<Orchestrator>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            storage,
            orchestrator,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(Arc<dyn Storage>, storage);
crate::impl_from_ref!(Arc<Orchestrator>, orchestrator);
crate::impl_from_ref!(std::time::Instant, start_time);
