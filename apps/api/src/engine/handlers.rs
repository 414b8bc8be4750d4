//! Axum route handlers for the assessment engine.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::engine::orchestrator::{get_session, start_session, submit_answer};
use crate::engine::session::SessionDocument;
use crate::errors::AppError;
use crate::models::session::SessionStatus;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub assessment_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub session_id: Uuid,
    pub question: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub session_id: Uuid,
    pub answer: String,
}

/// `next_question` is serialized as an explicit `null` on completion — the
/// client keys off it to end the conversation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub status: SessionStatus,
    pub next_question: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /engine/start
///
/// Creates (or resumes) the caller's session on an assessment and returns
/// the first question.
pub async fn handle_start(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<StartRequest>,
) -> Result<(StatusCode, Json<StartResponse>), AppError> {
    let outcome = start_session(
        &state.db,
        state.gateway.as_ref(),
        request.assessment_id,
        caller,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartResponse {
            session_id: outcome.session_id,
            question: outcome.question,
        }),
    ))
}

/// POST /engine/submit
///
/// Records one answer and returns either the next question or the completed
/// status with `nextQuestion: null`.
pub async fn handle_submit(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    if request.answer.trim().is_empty() {
        return Err(AppError::Validation("answer cannot be empty".to_string()));
    }

    let outcome = submit_answer(
        &state.db,
        state.gateway.as_ref(),
        request.session_id,
        &request.answer,
        caller,
    )
    .await?;

    Ok(Json(SubmitResponse {
        status: outcome.status,
        next_question: outcome.next_question,
    }))
}

/// GET /engine/session/:session_id
///
/// Returns the full session snapshot for the owning caller.
pub async fn handle_get_session(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDocument>, AppError> {
    let session = get_session(&state.db, session_id, caller).await?;
    Ok(Json(session))
}
