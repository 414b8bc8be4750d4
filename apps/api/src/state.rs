use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::engine::gateway::ModelGateway;

/// Shared application state injected into all route handlers via Axum
/// extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Model gateway capability — constructed once at startup, injected
    /// everywhere. Swappable for a stub in tests.
    pub gateway: Arc<dyn ModelGateway>,
    pub config: Config,
}
