//! Session Store — whole-document persistence for assessment sessions.
//!
//! Loads convert the raw row into the typed `SessionDocument` exactly once;
//! saves commit every mutation of one operation in a single version-checked
//! UPDATE. A concurrent writer that committed first makes the check fail and
//! the losing operation is rejected instead of silently clobbering.

use anyhow::anyhow;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::engine::session::{SessionDocument, SessionMetadata};
use crate::errors::AppError;
use crate::models::assessment::AssessmentRow;
use crate::models::session::{SessionRow, SessionStatus};

/// A session loaded together with its (read-only) assessment. Produced once
/// by `load_resolved`; downstream code never re-resolves the reference.
pub struct ResolvedSession {
    pub session: SessionDocument,
    pub assessment: AssessmentRow,
}

fn into_document(row: SessionRow) -> Result<SessionDocument, AppError> {
    let status: SessionStatus = row
        .status
        .parse()
        .map_err(|e: anyhow::Error| AppError::Internal(e))?;
    Ok(SessionDocument {
        id: row.id,
        assessment_id: row.assessment_id,
        candidate_id: row.candidate_id,
        status,
        version: row.version,
        transcript: row.transcript.0,
        responses: row.responses.0,
        metrics: row.metrics.0,
        candidate_report: row.candidate_report,
        recruiter_report: row.recruiter_report,
        metadata: SessionMetadata {
            started_at: row.started_at,
            completed_at: row.completed_at,
            expires_at: row.expires_at,
        },
    })
}

pub async fn load_assessment(pool: &PgPool, id: Uuid) -> Result<Option<AssessmentRow>, AppError> {
    Ok(
        sqlx::query_as::<_, AssessmentRow>("SELECT * FROM assessments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn load_session(pool: &PgPool, id: Uuid) -> Result<Option<SessionDocument>, AppError> {
    let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM assessment_sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(into_document).transpose()
}

/// Loads a session together with the assessment it references.
pub async fn load_resolved(pool: &PgPool, id: Uuid) -> Result<Option<ResolvedSession>, AppError> {
    let Some(session) = load_session(pool, id).await? else {
        return Ok(None);
    };
    let assessment = load_assessment(pool, session.assessment_id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow!(
                "Session {} references missing assessment {}",
                session.id,
                session.assessment_id
            ))
        })?;
    Ok(Some(ResolvedSession {
        session,
        assessment,
    }))
}

/// The most recent live session for one (candidate, assessment) pair.
/// Backed by the composite index; the intended design target is at most one.
pub async fn find_live_session(
    pool: &PgPool,
    candidate_id: Uuid,
    assessment_id: Uuid,
) -> Result<Option<SessionDocument>, AppError> {
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT * FROM assessment_sessions
        WHERE candidate_id = $1 AND assessment_id = $2
          AND status IN ('initialized', 'in-progress')
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(candidate_id)
    .bind(assessment_id)
    .fetch_optional(pool)
    .await?;
    row.map(into_document).transpose()
}

pub async fn insert_session(pool: &PgPool, session: &SessionDocument) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO assessment_sessions
            (id, assessment_id, candidate_id, status, version, transcript, responses,
             metrics, candidate_report, recruiter_report, started_at, completed_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(session.id)
    .bind(session.assessment_id)
    .bind(session.candidate_id)
    .bind(session.status.as_str())
    .bind(session.version)
    .bind(Json(&session.transcript))
    .bind(Json(&session.responses))
    .bind(Json(&session.metrics))
    .bind(&session.candidate_report)
    .bind(&session.recruiter_report)
    .bind(session.metadata.started_at)
    .bind(session.metadata.completed_at)
    .bind(session.metadata.expires_at)
    .execute(pool)
    .await?;

    info!(
        "Created session {} for candidate {} on assessment {}",
        session.id, session.candidate_id, session.assessment_id
    );
    Ok(())
}

/// Persists the mutated document. The WHERE clause pins the version the
/// document was loaded at; zero affected rows means another writer committed
/// in between and this operation loses with a conflict — no partial state is
/// ever visible.
pub async fn save_session(pool: &PgPool, session: &SessionDocument) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE assessment_sessions
        SET status = $2,
            version = version + 1,
            transcript = $3,
            responses = $4,
            metrics = $5,
            candidate_report = $6,
            recruiter_report = $7,
            completed_at = $8
        WHERE id = $1 AND version = $9
        "#,
    )
    .bind(session.id)
    .bind(session.status.as_str())
    .bind(Json(&session.transcript))
    .bind(Json(&session.responses))
    .bind(Json(&session.metrics))
    .bind(&session.candidate_report)
    .bind(&session.recruiter_report)
    .bind(session.metadata.completed_at)
    .bind(session.version)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(format!(
            "Session {} was modified concurrently",
            session.id
        )));
    }
    Ok(())
}
