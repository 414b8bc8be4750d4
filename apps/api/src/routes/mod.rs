pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assessments::handlers as assessment_handlers;
use crate::engine::handlers as engine_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Assessment engine
        .route("/engine/start", post(engine_handlers::handle_start))
        .route("/engine/submit", post(engine_handlers::handle_submit))
        .route(
            "/engine/session/:session_id",
            get(engine_handlers::handle_get_session),
        )
        // Recruiter assessment authoring
        .route(
            "/assessments",
            post(assessment_handlers::handle_create_assessment),
        )
        .route(
            "/assessments/:assessment_id",
            get(assessment_handlers::handle_get_assessment),
        )
        .with_state(state)
}
