//! Assessment Orchestrator — drives the interview session lifecycle.
//!
//! Flow per operation: resolve identity (done upstream) → load → mutate the
//! document in memory via `engine::session` → persist once. Model gateway
//! calls sit between load and save and can only degrade to fallbacks, so the
//! state machine always advances.

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::engine::gateway::{ModelGateway, FALLBACK_QUESTION};
use crate::engine::session::SessionDocument;
use crate::engine::store;
use crate::errors::AppError;
use crate::models::session::SessionStatus;

/// Result of `start_session`: the session to drive and the question the
/// candidate should see first.
pub struct StartOutcome {
    pub session_id: Uuid,
    pub question: String,
}

/// Result of `submit_answer`. `next_question` is `None` exactly when the
/// session completed.
pub struct SubmitOutcome {
    pub status: SessionStatus,
    pub next_question: Option<String>,
}

/// Starts (or resumes) a session for the caller on the given assessment.
///
/// The only session-creating path. One live session per (candidate,
/// assessment) pair: an existing live, unexpired session is resumed instead
/// of duplicated; an expired one is closed and replaced.
pub async fn start_session(
    pool: &PgPool,
    gateway: &dyn ModelGateway,
    assessment_id: Uuid,
    caller: CallerIdentity,
) -> Result<StartOutcome, AppError> {
    let assessment = store::load_assessment(pool, assessment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {assessment_id} not found")))?;

    let now = Utc::now();

    if let Some(mut live) = store::find_live_session(pool, caller.0, assessment_id).await? {
        if live.is_expired_at(now) {
            live.expire();
            store::save_session(pool, &live).await?;
            info!("Closed expired session {} before restart", live.id);
        } else {
            let question = live
                .last_ai_question()
                .unwrap_or(FALLBACK_QUESTION)
                .to_string();
            info!(
                "Resuming live session {} for candidate {}",
                live.id, caller.0
            );
            return Ok(StartOutcome {
                session_id: live.id,
                question,
            });
        }
    }

    let mut session = SessionDocument::create(assessment_id, caller.0, now);
    let question = gateway
        .next_question(&assessment.job_role, &session.transcript)
        .await;
    session.append_ai_turn(&question, now);

    store::insert_session(pool, &session).await?;

    Ok(StartOutcome {
        session_id: session.id,
        question,
    })
}

/// Records one candidate answer: evaluates it, appends transcript and
/// response entries, and either asks the next question or — on the answer
/// that reaches the quota — completes the session with aggregate metrics and
/// both narrative reports. All mutations commit in one version-checked
/// write.
pub async fn submit_answer(
    pool: &PgPool,
    gateway: &dyn ModelGateway,
    session_id: Uuid,
    answer: &str,
    caller: CallerIdentity,
) -> Result<SubmitOutcome, AppError> {
    let resolved = store::load_resolved(pool, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;

    // Same response for "absent" and "not yours": existence must not leak.
    if resolved.session.candidate_id != caller.0 {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }

    let mut session = resolved.session;
    let job_role = resolved.assessment.job_role;
    let now = Utc::now();

    // Lazy expiry: a live session past its deadline transitions exactly once.
    if session.status == SessionStatus::InProgress && session.is_expired_at(now) {
        session.expire();
        store::save_session(pool, &session).await?;
        return Err(AppError::SessionState("Session has expired".to_string()));
    }

    if session.status != SessionStatus::InProgress {
        return Err(AppError::SessionState(format!(
            "Session is already {}",
            session.status
        )));
    }

    session.append_user_turn(answer, now);

    let question = session.current_question().to_string();
    let evaluation = gateway.evaluate(&question, answer, &job_role).await;
    session.record_response(&question, answer, Some(evaluation), now);

    if session.quota_reached() {
        let overall_score = session.overall_score();
        let evaluations = session.evaluations();
        let report = gateway
            .report(&job_role, &session.transcript, &evaluations)
            .await;
        session.complete(overall_score, report, now);

        store::save_session(pool, &session).await?;

        info!(
            "Session {} completed with overall score {:.1}",
            session.id, overall_score
        );
        return Ok(SubmitOutcome {
            status: SessionStatus::Completed,
            next_question: None,
        });
    }

    let next_question = gateway.next_question(&job_role, &session.transcript).await;
    session.append_ai_turn(&next_question, now);

    store::save_session(pool, &session).await?;

    Ok(SubmitOutcome {
        status: SessionStatus::InProgress,
        next_question: Some(next_question),
    })
}

/// Read-only full session snapshot. Ownership is enforced with the same
/// 404-on-mismatch policy as submission.
pub async fn get_session(
    pool: &PgPool,
    session_id: Uuid,
    caller: CallerIdentity,
) -> Result<SessionDocument, AppError> {
    let session = store::load_session(pool, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;

    if session.candidate_id != caller.0 {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }

    Ok(session)
}
